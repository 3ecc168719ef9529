use std::fmt;

use crate::raw::input::input_id;

/// Hardware identity reported by a device.
///
/// For virtual devices this is whatever the creator put in the device description; a
/// [`VirtualDevice`] starts out with [`Bus::VIRTUAL`] and zero vendor, product and version.
///
/// [`VirtualDevice`]: crate::VirtualDevice
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct InputId(pub(crate) input_id);

impl InputId {
    #[inline]
    pub const fn new(bus: Bus, vendor: u16, product: u16, version: u16) -> Self {
        Self(input_id {
            bustype: bus.0,
            vendor,
            product,
            version,
        })
    }

    #[inline]
    pub const fn bus(&self) -> Bus {
        Bus(self.0.bustype)
    }

    #[inline]
    pub const fn vendor(&self) -> u16 {
        self.0.vendor
    }

    #[inline]
    pub const fn product(&self) -> u16 {
        self.0.product
    }

    #[inline]
    pub const fn version(&self) -> u16 {
        self.0.version
    }
}

impl Default for InputId {
    /// A virtual device with no vendor or product information.
    fn default() -> Self {
        Self::new(Bus::VIRTUAL, 0, 0, 0)
    }
}

impl fmt::Debug for InputId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputId")
            .field("bus", &self.bus())
            .field("vendor", &format_args!("{:#06x}", self.vendor()))
            .field("product", &format_args!("{:#06x}", self.product()))
            .field("version", &format_args!("{:#06x}", self.version()))
            .finish()
    }
}

ffi_enum! {
    /// Bus types that devices can be attached to the system with.
    pub enum Bus: u16 as "BUS_" {
        PCI         = 0x01,
        ISAPNP      = 0x02,
        USB         = 0x03,
        HIL         = 0x04,
        BLUETOOTH   = 0x05,
        VIRTUAL     = 0x06,
        ISA         = 0x10,
        I8042       = 0x11,
        XTKBD       = 0x12,
        RS232       = 0x13,
        GAMEPORT    = 0x14,
        PARPORT     = 0x15,
        AMIGA       = 0x16,
        ADB         = 0x17,
        I2C         = 0x18,
        HOST        = 0x19,
        GSC         = 0x1A,
        ATARI       = 0x1B,
        SPI         = 0x1C,
        RMI         = 0x1D,
        CEC         = 0x1E,
        INTEL_ISHTP = 0x1F,
        AMD_SFH     = 0x20,
    }
}
