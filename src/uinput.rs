//! Virtual input devices.
//!
//! A [`VirtualDevice`] goes through two phases. While *configuring*, the program declares which
//! event types, keys and axes the device will emit. [`VirtualDevice::activate`] then registers the
//! device with the kernel, after which it shows up as a regular event device (`/dev/input/event*`)
//! and can emit events. The two phases are enforced at runtime: configuration calls on an active
//! device fail with [`Error::AlreadyActivated`], writes to a device that is still configuring fail
//! with [`Error::NotActivated`].
//!
//! [`Builder`] wraps the configuring phase in a separate type, which makes configuring an active
//! device impossible to express in the first place.

use std::{
    ffi::{OsString, c_char, c_int},
    fmt,
    fs::{self, File},
    io::Write as _,
    mem,
    os::unix::{ffi::OsStringExt, fs::OpenOptionsExt},
    path::{Path, PathBuf},
    ptr, slice,
    time::Instant,
};

use uoctl::Ioctl;

use crate::{
    InputId, WriteErrors,
    error::{Error, IoctlError, Result},
    event::{EventType, InputEvent, Syn},
    input_id::Bus,
    raw::{
        input::{ABS_CNT, ABS_MAX},
        uinput::{
            UI_DEV_CREATE, UI_DEV_DESTROY, UI_GET_SYSNAME, UI_SET_ABSBIT, UI_SET_EVBIT,
            UI_SET_KEYBIT, UI_SET_LEDBIT, UI_SET_MSCBIT, UI_SET_PROPBIT, UI_SET_RELBIT,
            UI_SET_SNDBIT, UI_SET_SWBIT, UINPUT_MAX_NAME_SIZE, uinput_user_dev,
        },
    },
    util::{self, fetch_string},
    write_record,
};

/// Path of the uinput control node used by [`VirtualDevice::open`].
///
/// Some systems only provide `/dev/input/uinput`; use [`VirtualDevice::open_path`] for those.
pub const DEFAULT_UINPUT_PATH: &str = "/dev/uinput";

/// Device name used by [`VirtualDevice::activate_default`].
pub const DEFAULT_NAME: &str = "Rust-Powered Virtual Input Device";

/// Kinds of capabilities a [`VirtualDevice`] can declare.
///
/// Each kind corresponds to one of the `UI_SET_*BIT` ioctls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Capability {
    /// An [`EventType`] the device emits. The code is the raw event type.
    EventType,
    Key,
    Rel,
    Abs,
    Misc,
    Led,
    Sound,
    Switch,
    /// An input device property like `INPUT_PROP_DIRECT`.
    Prop,
}

impl Capability {
    fn ioctl(self) -> (&'static str, Ioctl<c_int>) {
        match self {
            Capability::EventType => ("UI_SET_EVBIT", UI_SET_EVBIT),
            Capability::Key => ("UI_SET_KEYBIT", UI_SET_KEYBIT),
            Capability::Rel => ("UI_SET_RELBIT", UI_SET_RELBIT),
            Capability::Abs => ("UI_SET_ABSBIT", UI_SET_ABSBIT),
            Capability::Misc => ("UI_SET_MSCBIT", UI_SET_MSCBIT),
            Capability::Led => ("UI_SET_LEDBIT", UI_SET_LEDBIT),
            Capability::Sound => ("UI_SET_SNDBIT", UI_SET_SNDBIT),
            Capability::Switch => ("UI_SET_SWBIT", UI_SET_SWBIT),
            Capability::Prop => ("UI_SET_PROPBIT", UI_SET_PROPBIT),
        }
    }

    /// Returns the event type that codes of this kind are sent with.
    fn event_type(self) -> Option<EventType> {
        Some(match self {
            Capability::Key => EventType::KEY,
            Capability::Rel => EventType::REL,
            Capability::Abs => EventType::ABS,
            Capability::Misc => EventType::MSC,
            Capability::Led => EventType::LED,
            Capability::Sound => EventType::SND,
            Capability::Switch => EventType::SW,
            Capability::EventType | Capability::Prop => return None,
        })
    }
}

/// The two kinds of axes, see [`VirtualDevice::declare_axis`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Rel,
    Abs,
}

impl From<Axis> for Capability {
    fn from(axis: Axis) -> Self {
        match axis {
            Axis::Rel => Capability::Rel,
            Axis::Abs => Capability::Abs,
        }
    }
}

/// Value range and filtering parameters of an axis.
///
/// The kernel requires `minimum <= maximum` for every declared absolute axis (unless both are 0)
/// and rejects the device on activation otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AxisRange {
    minimum: i32,
    maximum: i32,
    fuzz: i32,
    flat: i32,
}

impl AxisRange {
    /// Creates an [`AxisRange`] with zero fuzz and flat values.
    #[inline]
    pub const fn new(minimum: i32, maximum: i32) -> Self {
        Self {
            minimum,
            maximum,
            fuzz: 0,
            flat: 0,
        }
    }

    /// Returns a copy of `self` with the given fuzz value, which the kernel uses to filter noise.
    #[inline]
    pub const fn with_fuzz(mut self, fuzz: i32) -> Self {
        self.fuzz = fuzz;
        self
    }

    /// Returns a copy of `self` with the given flat value (the deadzone around the center).
    #[inline]
    pub const fn with_flat(mut self, flat: i32) -> Self {
        self.flat = flat;
        self
    }

    #[inline]
    pub const fn minimum(&self) -> i32 {
        self.minimum
    }

    #[inline]
    pub const fn maximum(&self) -> i32 {
        self.maximum
    }

    #[inline]
    pub const fn fuzz(&self) -> i32 {
        self.fuzz
    }

    #[inline]
    pub const fn flat(&self) -> i32 {
        self.flat
    }
}

/// The device description in its legacy `uinput_user_dev` form.
///
/// This is written to the uinput node as a whole right before `UI_DEV_CREATE`.
struct Blob(Box<uinput_user_dev>);

impl Blob {
    fn new() -> Self {
        // Safety: `uinput_user_dev` consists of integers only.
        let mut dev: Box<uinput_user_dev> = Box::new(unsafe { mem::zeroed() });
        dev.id.bustype = Bus::VIRTUAL.raw();
        let mut blob = Self(dev);
        blob.set_name(DEFAULT_NAME);
        blob
    }

    /// Sets the device name, truncating it to fit. Returns whether truncation happened.
    fn set_name(&mut self, name: &str) -> bool {
        // The kernel copies at most `UINPUT_MAX_NAME_SIZE` bytes and terminates the copy itself,
        // so a name filling the whole field needs no NUL.
        let bytes = name.as_bytes();
        let len = bytes.len().min(UINPUT_MAX_NAME_SIZE);
        self.0.name = [0; UINPUT_MAX_NAME_SIZE];
        for (dst, &src) in self.0.name.iter_mut().zip(&bytes[..len]) {
            *dst = src as c_char;
        }
        len < bytes.len()
    }

    fn name(&self) -> Vec<u8> {
        self.0
            .name
            .iter()
            .map(|&c| c as u8)
            .take_while(|&b| b != 0)
            .collect()
    }

    fn set_range(&mut self, code: u16, range: AxisRange) -> Result<()> {
        let i = usize::from(code);
        if i >= ABS_CNT {
            return Err(Error::CodeOutOfRange { code, max: ABS_MAX });
        }
        self.0.absmin[i] = range.minimum;
        self.0.absmax[i] = range.maximum;
        self.0.absfuzz[i] = range.fuzz;
        self.0.absflat[i] = range.flat;
        Ok(())
    }

    /// Records the range of a declared axis. The tables are indexed by absolute axis code, so
    /// relative axes must not touch them.
    fn record_axis(&mut self, axis: Axis, code: u16, range: AxisRange) -> Result<()> {
        match axis {
            Axis::Rel => Ok(()),
            Axis::Abs => self.set_range(code, range),
        }
    }

    #[cfg(test)]
    fn range(&self, code: u16) -> Option<AxisRange> {
        let i = usize::from(code);
        (i < ABS_CNT).then(|| {
            AxisRange::new(self.0.absmin[i], self.0.absmax[i])
                .with_fuzz(self.0.absfuzz[i])
                .with_flat(self.0.absflat[i])
        })
    }

    fn as_bytes(&self) -> &[u8] {
        // Safety: `uinput_user_dev` has no padding, so all of its bytes are initialized.
        unsafe {
            slice::from_raw_parts(
                ptr::from_ref(&*self.0).cast::<u8>(),
                size_of::<uinput_user_dev>(),
            )
        }
    }
}

impl fmt::Debug for Blob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Blob")
            .field("name", &String::from_utf8_lossy(&self.name()))
            .field("id", &InputId(self.0.id))
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
enum State {
    Configuring { file: File, blob: Blob },
    Active { file: File },
    Closed,
}

/// An owned handle to a virtual input device created through uinput.
///
/// The handle starts out configuring (see the [module documentation](self)). Closing it, or
/// dropping it, destroys the device and releases the descriptor; closing is idempotent, and every
/// other operation on a closed handle fails with [`Error::UseAfterClose`].
///
/// The uinput node is opened write-only and non-blocking, so writing events never blocks. Events
/// the kernel can't accept are handled according to [`VirtualDevice::set_write_errors`].
#[derive(Debug)]
pub struct VirtualDevice {
    state: State,
    path: PathBuf,
    write_errors: WriteErrors,
}

impl VirtualDevice {
    /// Opens [`DEFAULT_UINPUT_PATH`] to configure a new virtual device.
    pub fn open() -> Result<Self> {
        Self::open_path(DEFAULT_UINPUT_PATH)
    }

    /// Opens the uinput control node at `path` to configure a new virtual device.
    ///
    /// The device description starts out with [`Bus::VIRTUAL`], [`DEFAULT_NAME`] and no
    /// capabilities.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpenFailed`] if the node can't be opened for writing, typically because
    /// the uinput module isn't loaded or the user lacks permission.
    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::options()
            .write(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|source| Error::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!("opened uinput node '{}'", path.display());

        Ok(Self {
            state: State::Configuring {
                file,
                blob: Blob::new(),
            },
            path: path.to_path_buf(),
            write_errors: WriteErrors::default(),
        })
    }

    /// Opens [`DEFAULT_UINPUT_PATH`] and returns a [`Builder`] for the device.
    pub fn builder() -> Result<Builder> {
        Ok(Builder { dev: Self::open()? })
    }

    fn configuring(&mut self) -> Result<(&File, &mut Blob)> {
        match &mut self.state {
            State::Configuring { file, blob } => Ok((&*file, blob)),
            State::Active { .. } => Err(Error::AlreadyActivated),
            State::Closed => Err(Error::UseAfterClose),
        }
    }

    fn active(&self) -> Result<&File> {
        match &self.state {
            State::Active { file } => Ok(file),
            State::Configuring { .. } => Err(Error::NotActivated),
            State::Closed => Err(Error::UseAfterClose),
        }
    }

    /// Returns the path of the uinput node this handle was opened from.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether [`VirtualDevice::activate`] has succeeded and the handle is still open.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active { .. })
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Configures how writes handle errors from the kernel.
    ///
    /// The default is [`WriteErrors::Discard`].
    pub fn set_write_errors(&mut self, policy: WriteErrors) {
        self.write_errors = policy;
    }

    /// Declares that the device can emit `code` of the given kind.
    ///
    /// For every kind but [`Capability::EventType`] and [`Capability::Prop`], the event type the
    /// code belongs to is declared as well.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::AlreadyActivated`] after activation. Kernel errors (for example a code
    /// above the maximum for its kind) are returned as [`Error::Io`].
    pub fn declare(&mut self, kind: Capability, code: u16) -> Result<()> {
        let (file, _) = self.configuring()?;
        enable(file, kind, code)
    }

    /// Declares an axis and records its range in the device description.
    ///
    /// Absolute axes need a valid range. The kernel keeps no range for relative axes, so `range`
    /// is ignored for them. The range is only recorded once the kernel has accepted the axis.
    ///
    /// # Errors
    ///
    /// Besides the errors of [`VirtualDevice::declare`], fails with [`Error::CodeOutOfRange`] if
    /// an absolute axis `code` is not below `ABS_CNT` (64), the size of the kernel's axis tables.
    pub fn declare_axis(&mut self, axis: Axis, code: u16, range: AxisRange) -> Result<()> {
        let (file, blob) = self.configuring()?;
        if axis == Axis::Abs && usize::from(code) >= ABS_CNT {
            return Err(Error::CodeOutOfRange { code, max: ABS_MAX });
        }
        enable(file, axis.into(), code)?;
        blob.record_axis(axis, code, range)
    }

    /// Declares an event type, see [`Capability::EventType`].
    pub fn declare_event_type(&mut self, ty: EventType) -> Result<()> {
        self.declare(Capability::EventType, ty.raw())
    }

    /// Declares a key or button code.
    pub fn declare_key(&mut self, code: u16) -> Result<()> {
        self.declare(Capability::Key, code)
    }

    /// Declares a relative axis with the given range.
    pub fn declare_rel_axis(&mut self, code: u16, min: i32, max: i32) -> Result<()> {
        self.declare_axis(Axis::Rel, code, AxisRange::new(min, max))
    }

    /// Declares an absolute axis with the given range.
    pub fn declare_abs_axis(&mut self, code: u16, min: i32, max: i32) -> Result<()> {
        self.declare_axis(Axis::Abs, code, AxisRange::new(min, max))
    }

    /// Sets the bus, vendor, product and version IDs of the device.
    pub fn set_input_id(&mut self, id: InputId) -> Result<()> {
        let (_, blob) = self.configuring()?;
        blob.0.id = id.0;
        Ok(())
    }

    /// Registers the device with the kernel.
    ///
    /// `name` is cut off after `UINPUT_MAX_NAME_SIZE` (80) bytes. Once this succeeds, the
    /// device is active for the rest of its lifetime.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::ActivationFailed`] if the kernel rejects the description, for example
    /// because an absolute axis has a minimum above its maximum. The handle stays in the
    /// configuring state in that case.
    pub fn activate(&mut self, name: &str) -> Result<()> {
        let now = Instant::now();
        let (file, blob) = self.configuring()?;
        if blob.set_name(name) {
            log::debug!(
                "virtual device name '{name}' truncated to {} bytes",
                UINPUT_MAX_NAME_SIZE
            );
        }

        let mut writer = file;
        writer
            .write_all(blob.as_bytes())
            .map_err(Error::ActivationFailed)?;
        unsafe { UI_DEV_CREATE.ioctl(file) }
            .map_err(|e| Error::ActivationFailed(IoctlError::wrap("UI_DEV_CREATE", e)))?;

        self.state = match mem::replace(&mut self.state, State::Closed) {
            State::Configuring { file, .. } => State::Active { file },
            other => other,
        };
        log::debug!(
            "created virtual device '{name}' via '{}' in {:?}",
            self.path.display(),
            now.elapsed()
        );
        Ok(())
    }

    /// Registers the device under [`DEFAULT_NAME`], see [`VirtualDevice::activate`].
    pub fn activate_default(&mut self) -> Result<()> {
        self.activate(DEFAULT_NAME)
    }

    /// Emits an event with the given fields.
    ///
    /// Readers see events only once a `SYN_REPORT` follows them, see [`VirtualDevice::sync`].
    /// The kernel fills in the timestamp, and silently drops events for codes the device didn't
    /// declare, as well as key and absolute axis events that don't change the current state.
    pub fn write(&self, ty: EventType, code: u16, value: i32) -> Result<()> {
        self.write_event(&InputEvent::new(ty, code, value))
    }

    /// Emits a prepared [`InputEvent`], see [`VirtualDevice::write`].
    pub fn write_event(&self, event: &InputEvent) -> Result<()> {
        write_record(self.active()?, event, self.write_errors)
    }

    /// Emits a `SYN_REPORT`, publishing the events written since the last one.
    pub fn sync(&self) -> Result<()> {
        self.write(EventType::SYN, Syn::REPORT.raw(), 0)
    }

    /// Returns the name of the device's directory under `/sys/devices/virtual/input/`.
    #[doc(alias = "UI_GET_SYSNAME")]
    pub fn sysname(&self) -> Result<OsString> {
        let bytes = unsafe { fetch_string(self.active()?, "UI_GET_SYSNAME", UI_GET_SYSNAME)? };
        Ok(OsString::from_vec(bytes))
    }

    /// Returns the path of the event device node the kernel created for this device.
    ///
    /// The node is named by the kernel right away, but may take a moment to appear in `/dev`
    /// (and to receive its final permissions), so opening it can briefly fail.
    ///
    /// Returns `Ok(None)` if sysfs lists no event device for it.
    pub fn evdev_path(&self) -> Result<Option<PathBuf>> {
        let dir = Path::new("/sys/devices/virtual/input").join(self.sysname()?);
        for entry in fs::read_dir(dir)? {
            let name = entry?.file_name();
            if name.as_encoded_bytes().starts_with(b"event") {
                return Ok(Some(Path::new("/dev/input").join(name)));
            }
        }
        Ok(None)
    }

    /// Destroys the device and closes the handle.
    ///
    /// Works in both states: destroying a device that was never activated is a no-op for the
    /// kernel. Closing an already closed handle does nothing.
    pub fn close(&mut self) {
        match mem::replace(&mut self.state, State::Closed) {
            State::Closed => {}
            State::Configuring { file, .. } | State::Active { file } => {
                if let Err(e) = unsafe { UI_DEV_DESTROY.ioctl(&file) } {
                    log::trace!("UI_DEV_DESTROY failed for '{}': {e}", self.path.display());
                }
                drop(file);
                log::debug!("closed virtual device handle '{}'", self.path.display());
            }
        }
    }
}

impl Drop for VirtualDevice {
    fn drop(&mut self) {
        self.close();
    }
}

fn enable(file: &File, kind: Capability, code: u16) -> Result<()> {
    if let Some(ty) = kind.event_type() {
        unsafe { util::ioctl(file, "UI_SET_EVBIT", UI_SET_EVBIT, ty.raw().into())? };
    }
    let (name, ioctl) = kind.ioctl();
    unsafe { util::ioctl(file, name, ioctl, code.into())? };
    Ok(())
}

/// Configures a [`VirtualDevice`] and activates it.
///
/// Returned by [`VirtualDevice::builder`]. Each method forwards to the corresponding
/// `VirtualDevice::declare*` method, and [`Builder::build`] to [`VirtualDevice::activate`].
#[derive(Debug)]
pub struct Builder {
    dev: VirtualDevice,
}

impl Builder {
    /// Sets the device's hardware IDs.
    pub fn with_input_id(mut self, id: InputId) -> Result<Self> {
        self.dev.set_input_id(id)?;
        Ok(self)
    }

    /// Declares a list of codes of one kind.
    pub fn with_codes(
        mut self,
        kind: Capability,
        codes: impl IntoIterator<Item = u16>,
    ) -> Result<Self> {
        for code in codes {
            self.dev.declare(kind, code)?;
        }
        Ok(self)
    }

    /// Declares a list of key and button codes.
    pub fn with_keys(self, keys: impl IntoIterator<Item = u16>) -> Result<Self> {
        self.with_codes(Capability::Key, keys)
    }

    /// Declares a list of relative axes.
    pub fn with_rel_axes(self, axes: impl IntoIterator<Item = u16>) -> Result<Self> {
        self.with_codes(Capability::Rel, axes)
    }

    /// Declares a list of absolute axes with their ranges.
    pub fn with_abs_axes(
        mut self,
        axes: impl IntoIterator<Item = (u16, AxisRange)>,
    ) -> Result<Self> {
        for (code, range) in axes {
            self.dev.declare_axis(Axis::Abs, code, range)?;
        }
        Ok(self)
    }

    /// Activates the device under `name`.
    pub fn build(mut self, name: &str) -> Result<VirtualDevice> {
        self.dev.activate(name)?;
        Ok(self.dev)
    }
}
