//! Input event records and the kernel's event taxonomy.
//!
//! Every read from an [`InputDevice`] yields an [`InputEvent`]: a timestamp plus the
//! `(type, code, value)` triple. The *type* is an [`EventType`]; the meaning of *code* and *value*
//! depends on it (a key code and a [`KeyState`] for [`EventType::KEY`], an axis code and a position
//! for [`EventType::ABS`], and so on).
//!
//! [`InputDevice`]: crate::InputDevice

use std::{
    fmt,
    time::{Duration, SystemTime},
};

use crate::raw::input::input_event;

ffi_enum! {
    /// Types of [`InputEvent`]s.
    pub enum EventType: u16 as "EV_" {
        /// Synchronization marker, see [`Syn`].
        SYN = 0x00,
        /// A key or button press, release, or repeat.
        KEY = 0x01,
        /// A relative axis movement.
        REL = 0x02,
        /// An absolute axis change.
        ABS = 0x03,
        /// A miscellaneous event.
        MSC = 0x04,
        /// A switch changed state.
        SW  = 0x05,
        /// An LED changed state, or is requested to change state.
        LED = 0x11,
        /// A sound started or stopped playing, or is requested to.
        SND = 0x12,
        /// The autorepeat settings have changed.
        REP = 0x14,
        /// Force-feedback control.
        FF  = 0x15,
        PWR = 0x16,
        FF_STATUS = 0x17,
    }
}

ffi_enum! {
    /// Synchronization event codes, used with [`EventType::SYN`].
    pub enum Syn: u16 as "SYN_" {
        /// Marks the end of a group of events.
        ///
        /// Readers only see events once the group has been terminated by a `SYN_REPORT`.
        REPORT = 0,
        CONFIG = 1,
        MT_REPORT = 2,
        /// One or more events were lost because the kernel buffer overflowed.
        DROPPED = 3,
    }
}

ffi_enum! {
    /// Value of a [`EventType::KEY`] event.
    pub enum KeyState: i32 as "" {
        RELEASED = 0,
        PRESSED = 1,
        REPEAT = 2,
    }
}

/// An input event received from or sent to a device.
///
/// This has the exact layout of the kernel's `struct input_event`.
#[derive(Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct InputEvent(pub(crate) input_event);

impl InputEvent {
    /// Creates an [`InputEvent`] from raw values.
    ///
    /// The timestamp is zero, which makes the kernel fill in the current time when the event is
    /// written to a uinput device.
    #[inline]
    pub const fn new(ty: EventType, raw_code: u16, raw_value: i32) -> Self {
        Self(input_event {
            time: libc::timeval {
                tv_sec: 0,
                tv_usec: 0,
            },
            type_: ty.0,
            code: raw_code,
            value: raw_value,
        })
    }

    /// Creates an all-zero event, which is a `SYN_REPORT` with a zero timestamp.
    #[inline]
    pub const fn zeroed() -> Self {
        Self::new(EventType::SYN, Syn::REPORT.0, 0)
    }

    /// Returns a copy of `self` timestamped with `time`.
    ///
    /// The timestamp is stored with microsecond resolution; anything finer is truncated.
    /// Times before the Unix epoch are clamped to the epoch.
    pub fn with_time(mut self, time: SystemTime) -> Self {
        let dur = time
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        self.0.time.tv_sec = dur.as_secs() as libc::time_t;
        self.0.time.tv_usec = dur.subsec_micros() as libc::suseconds_t;
        self
    }

    /// Returns the timestamp as fractional seconds.
    ///
    /// This is `seconds + microseconds / 1_000_000` of the kernel `timeval`.
    #[inline]
    pub fn timestamp(&self) -> f64 {
        self.0.time.tv_sec as f64 + self.0.time.tv_usec as f64 / 1_000_000.0
    }

    /// Returns the timestamp as a [`SystemTime`].
    ///
    /// The kernel uses `CLOCK_REALTIME` by default, which is the clock [`SystemTime::now`] reads.
    pub fn time(&self) -> SystemTime {
        let sec = self.0.time.tv_sec.max(0) as u64;
        let usec = self.0.time.tv_usec.clamp(0, 999_999) as u32;
        SystemTime::UNIX_EPOCH + Duration::new(sec, usec * 1000)
    }

    #[inline]
    pub fn event_type(&self) -> EventType {
        EventType(self.0.type_)
    }

    /// Returns the raw *event code*: which key, axis, LED, etc. the event is about.
    #[inline]
    pub fn raw_code(&self) -> u16 {
        self.0.code
    }

    /// Returns the raw *event value*: the new state of the key, axis, LED, etc.
    #[inline]
    pub fn raw_value(&self) -> i32 {
        self.0.value
    }
}

impl fmt::Debug for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("InputEvent");
        s.field("timestamp", &self.timestamp())
            .field("type", &self.event_type());
        match self.event_type() {
            EventType::SYN => s.field("code", &Syn(self.raw_code())),
            _ => s.field("code", &self.raw_code()),
        };
        match self.event_type() {
            EventType::KEY => s.field("value", &KeyState(self.raw_value())),
            _ => s.field("value", &self.raw_value()),
        };
        s.finish()
    }
}
