//! Error type shared by [`InputDevice`] and [`VirtualDevice`].
//!
//! Errors fall into two classes. *Contract violations* ([`Error::UseAfterClose`],
//! [`Error::AlreadyActivated`], [`Error::NotActivated`]) are caused by calling an operation in the
//! wrong handle state and indicate a bug in the caller. Everything else is an *environmental*
//! failure reported by the kernel, which a caller may want to react to (retry with different
//! permissions, skip a busy device, etc.).
//!
//! [`InputDevice`]: crate::InputDevice
//! [`VirtualDevice`]: crate::VirtualDevice

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type alias for device operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by device handle operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The device node could not be opened in any of the attempted modes.
    #[error("failed to open '{}': {source}", .path.display())]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A read returned part of an event record.
    ///
    /// The kernel always transfers whole records, so this points at a driver problem or at a path
    /// that isn't an event device.
    #[error("truncated input event record: read {read} of {expected} bytes")]
    TruncatedRecord { read: usize, expected: usize },

    /// A read that had to produce an event found none.
    #[error("end of input event stream")]
    EndOfStream,

    /// The handle has already been closed.
    #[error("device handle used after close")]
    UseAfterClose,

    /// The virtual device has already been created and can no longer be configured.
    #[error("cannot configure a virtual device after it has been activated")]
    AlreadyActivated,

    /// The virtual device has to be activated before it can emit events.
    #[error("virtual device has not been activated")]
    NotActivated,

    /// The kernel refused to create the virtual device.
    #[error("failed to create virtual device: {0}")]
    ActivationFailed(#[source] io::Error),

    /// An event code does not fit in the table it has to be recorded in.
    #[error("event code {code} is out of range (maximum is {max})")]
    CodeOutOfRange { code: u16, max: u16 },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl Error {
    /// Returns whether this error was caused by using a handle in the wrong state.
    ///
    /// These errors are never transient; retrying the same call on the same handle will fail the
    /// same way.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            Error::UseAfterClose | Error::AlreadyActivated | Error::NotActivated
        )
    }
}

/// An ioctl failure with the name of the request attached.
#[derive(Debug, Error)]
#[error("ioctl {name} failed ({kind:?})")]
pub(crate) struct IoctlError {
    pub(crate) name: &'static str,
    pub(crate) kind: io::ErrorKind,
    #[source]
    pub(crate) cause: io::Error,
}

impl IoctlError {
    /// Wraps `cause`, keeping its [`io::ErrorKind`] so callers can still match on it.
    pub(crate) fn wrap(name: &'static str, cause: io::Error) -> io::Error {
        log::trace!("ioctl {name} failed with error {cause} ({:?})", cause.kind());
        let kind = cause.kind();
        io::Error::new(kind, IoctlError { name, kind, cause })
    }
}
