/// Declares a transparent newtype over a kernel integer with named constants.
///
/// Unlike a Rust `enum`, any raw value is representable, so values the kernel (or a newer kernel)
/// uses but that have no name here still round-trip. `Debug` prints `$prefix` followed by the
/// constant name, or the type name and the raw value in hex.
macro_rules! ffi_enum {
    (
        $( #[$attrs:meta] )*
        $v:vis enum $name:ident: $native:ty as $prefix:literal {
            $(
                $( #[$variant_attrs:meta] )*
                $variant:ident = $value:expr
            ),+
            $(,)?
        }
    ) => {
        $( #[$attrs] )*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $v struct $name(pub(crate) $native);

        impl $name {
            $(
                $( #[$variant_attrs] )*
                $v const $variant: Self = Self($value);
            )+

            #[inline]
            pub const fn from_raw(raw: $native) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> $native {
                self.0
            }

            #[allow(unreachable_patterns)]
            fn variant_name(&self) -> Option<&'static str> {
                match self {
                    $(
                        &Self::$variant => Some(stringify!($variant)),
                    )*
                    _ => None,
                }
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                match self.variant_name() {
                    Some(name) => write!(f, "{}{name}", $prefix),
                    None => write!(f, "{}({:#x})", stringify!($name), self.0),
                }
            }
        }
    };
}
