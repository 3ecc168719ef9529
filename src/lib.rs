#![doc = include_str!("../README.md")]
#![warn(missing_debug_implementations)]

#[macro_use]
mod macros;


mod device;
mod error;
pub mod event;
mod input_id;
mod raw;
pub mod uinput;
mod util;

use std::{
    io::{self, Read, Write},
    ptr, slice,
};

pub use device::{Events, InputDevice};
pub use error::{Error, Result};
#[doc(inline)]
pub use event::{EventType, InputEvent};
pub use input_id::{Bus, InputId};
#[doc(inline)]
pub use uinput::VirtualDevice;

/// What a device handle does when the kernel rejects an event written to it.
///
/// Configured per handle via [`InputDevice::set_write_errors`] and
/// [`VirtualDevice::set_write_errors`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteErrors {
    /// Log the error at debug level and report success.
    ///
    /// Event writes are fire-and-forget by default: LED feedback sent to a device opened without
    /// write access, or events written faster than a non-blocking uinput node accepts them, are
    /// dropped silently.
    #[default]
    Discard,
    /// Return the error as [`Error::Io`].
    Report,
}

/// Reads exactly one event record from `src`.
///
/// A failed read is treated as "no event" (the usual cause is an unplugged device), as is a read
/// of 0 bytes. A read that returns part of a record is an error.
fn read_record(mut src: impl Read) -> Result<Option<InputEvent>> {
    let mut event = InputEvent::zeroed();
    // Safety: `InputEvent` is plain old data without padding (checked in `raw::input`), so any byte
    // pattern written into it is valid.
    let buf = unsafe {
        slice::from_raw_parts_mut(
            ptr::from_mut(&mut event).cast::<u8>(),
            size_of::<InputEvent>(),
        )
    };
    match src.read(buf) {
        Ok(0) => Ok(None),
        Ok(n) if n == size_of::<InputEvent>() => Ok(Some(event)),
        Ok(n) => Err(Error::TruncatedRecord {
            read: n,
            expected: size_of::<InputEvent>(),
        }),
        Err(e) => {
            log::debug!("event read failed, treating as no event: {e}");
            Ok(None)
        }
    }
}

/// Writes one event record to `dst`, handling a kernel error according to `policy`.
fn write_record(mut dst: impl Write, event: &InputEvent, policy: WriteErrors) -> Result<()> {
    // Safety: `InputEvent` has no padding (checked in `raw::input`), so all of its bytes are
    // initialized.
    let bytes = unsafe {
        slice::from_raw_parts(
            ptr::from_ref(event).cast::<u8>(),
            size_of::<InputEvent>(),
        )
    };
    match (dst.write_all(bytes), policy) {
        (Ok(()), _) => Ok(()),
        (Err(e), WriteErrors::Discard) => {
            log::debug!("discarding error from writing {event:?}: {e}");
            Ok(())
        }
        (Err(e), WriteErrors::Report) => Err(e.into()),
    }
}
