use std::{
    fs::File,
    io,
    os::fd::{AsRawFd, RawFd},
    path::{Path, PathBuf},
    time::Instant,
};

use crate::{
    WriteErrors,
    error::{Error, Result},
    event::{EventType, InputEvent},
    raw::input::{EVIOCGNAME, EVIOCGRAB},
    read_record,
    util::{self, fetch_string, is_readable, set_nonblocking},
    write_record,
};

/// An owned handle to an *event device* node like `/dev/input/event3`.
///
/// The handle owns exactly one file descriptor. It is released by [`InputDevice::close`], or when
/// the handle is dropped, whichever comes first. After `close`, every operation other than `close`
/// itself fails with [`Error::UseAfterClose`].
///
/// The descriptor is opened with `O_CLOEXEC`, so it is never inherited by child processes.
///
/// Reading is done one event at a time with no internal buffering. To wait for events from
/// several sources, register [`InputDevice::pollfd`] with `poll(2)`, `epoll(7)` or an async
/// reactor.
///
/// Concurrent use of one handle from several threads is memory-safe, but interleaved reads from
/// different threads will split the event stream between them in no particular order.
#[derive(Debug)]
pub struct InputDevice {
    file: Option<File>,
    path: PathBuf,
    writable: bool,
    write_errors: WriteErrors,
}

impl InputDevice {
    /// Opens an event device node.
    ///
    /// If `want_write` is `true`, the node is first opened for reading and writing, which allows
    /// sending feedback events (LEDs, sounds) with [`InputDevice::write`]. If that fails, or if
    /// `want_write` is `false`, the node is opened read-only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OpenFailed`] if the read-only attempt fails too. Its source is the error
    /// of that last attempt.
    pub fn open<P: AsRef<Path>>(path: P, want_write: bool) -> Result<Self> {
        let path = path.as_ref();
        let now = Instant::now();
        let (file, writable) =
            Self::try_open(path, want_write).map_err(|source| Error::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        log::debug!(
            "opened '{}' ({}) in {:?}",
            path.display(),
            if writable { "read-write" } else { "read-only" },
            now.elapsed(),
        );
        Ok(Self {
            file: Some(file),
            path: path.to_path_buf(),
            writable,
            write_errors: WriteErrors::default(),
        })
    }

    fn try_open(path: &Path, want_write: bool) -> io::Result<(File, bool)> {
        if want_write {
            match File::options().read(true).write(true).open(path) {
                Ok(file) => return Ok((file, true)),
                Err(e) => {
                    log::warn!(
                        "could not open '{}' in read-write mode ({e}), retrying in read-only",
                        path.display()
                    );
                }
            }
        }

        let file = File::options().read(true).open(path)?;
        Ok((file, false))
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or(Error::UseAfterClose)
    }

    /// Returns the path this device was opened from.
    ///
    /// This stays available after the handle is closed.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether the device was opened with write access.
    #[inline]
    pub fn is_writable(&self) -> bool {
        self.writable
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.file.is_none()
    }

    /// Configures how [`InputDevice::write`] handles errors from the kernel.
    ///
    /// The default is [`WriteErrors::Discard`].
    pub fn set_write_errors(&mut self, policy: WriteErrors) {
        self.write_errors = policy;
    }

    /// Reads a single event.
    ///
    /// Returns `Ok(None)` when the read fails or returns no data. This is what happens once a
    /// device has been unplugged, or when the handle is in non-blocking mode and no event is
    /// pending. In blocking mode (the default) this waits for the next event.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TruncatedRecord`] if the read returned only part of an event record.
    pub fn try_read(&self) -> Result<Option<InputEvent>> {
        read_record(self.file()?)
    }

    /// Reads a single event, treating the absence of one as an error.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EndOfStream`] in every case where [`InputDevice::try_read`] would return
    /// `Ok(None)`.
    pub fn read(&self) -> Result<InputEvent> {
        self.try_read()?.ok_or(Error::EndOfStream)
    }

    /// Returns an iterator that reads events until [`InputDevice::try_read`] yields none.
    pub fn events(&self) -> Events<'_> {
        Events { dev: self }
    }

    /// Grabs (`want == true`) or releases (`want == false`) the device.
    ///
    /// While a device is grabbed, its events are delivered only to the grabbing handle. The
    /// kernel releases the grab automatically when the handle is closed.
    ///
    /// Returns `Ok(false)` if the kernel refused, which is expected when another program (or
    /// another handle in this one) already holds the grab, or when releasing a device that isn't
    /// grabbed.
    #[doc(alias = "EVIOCGRAB")]
    pub fn grab(&self, want: bool) -> Result<bool> {
        let file = self.file()?;
        match unsafe { util::ioctl(file, "EVIOCGRAB", EVIOCGRAB, want.into()) } {
            Ok(_) => Ok(true),
            Err(e) => {
                log::debug!(
                    "{} '{}' failed: {e}",
                    if want { "grabbing" } else { "releasing" },
                    self.path.display()
                );
                Ok(false)
            }
        }
    }

    /// Releases a grab acquired with [`InputDevice::grab`].
    ///
    /// Same as `grab(false)`.
    pub fn ungrab(&self) -> Result<bool> {
        self.grab(false)
    }

    /// Writes an event with the given fields and a zero timestamp to the device.
    ///
    /// This is used for feedback like toggling keyboard LEDs, and requires that the device was
    /// opened with write access. Kernel errors are handled as configured by
    /// [`InputDevice::set_write_errors`] and are discarded by default.
    pub fn write(&self, ty: EventType, code: u16, value: i32) -> Result<()> {
        self.write_event(&InputEvent::new(ty, code, value))
    }

    /// Writes a prepared [`InputEvent`] to the device, see [`InputDevice::write`].
    pub fn write_event(&self, event: &InputEvent) -> Result<()> {
        write_record(self.file()?, event, self.write_errors)
    }

    /// Returns the raw file descriptor, for registering with an external readiness mechanism.
    ///
    /// The descriptor stays owned by this handle: it must not be closed by the caller, and it
    /// becomes invalid once this handle is closed or dropped.
    pub fn pollfd(&self) -> Result<RawFd> {
        Ok(self.file()?.as_raw_fd())
    }

    /// Returns whether an event can be read without blocking.
    pub fn is_readable(&self) -> Result<bool> {
        Ok(is_readable(self.file()?)?)
    }

    /// Moves this handle into or out of non-blocking mode.
    ///
    /// Returns whether the handle was previously in non-blocking mode. In non-blocking mode,
    /// [`InputDevice::try_read`] returns `Ok(None)` instead of waiting when no event is pending.
    pub fn set_nonblocking(&self, nonblocking: bool) -> Result<bool> {
        Ok(set_nonblocking(self.file()?, nonblocking)?)
    }

    /// Fetches the device name.
    #[doc(alias = "EVIOCGNAME")]
    pub fn name(&self) -> Result<String> {
        let bytes = unsafe { fetch_string(self.file()?, "EVIOCGNAME", EVIOCGNAME)? };
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Closes the device.
    ///
    /// Closing an already closed handle does nothing.
    pub fn close(&mut self) {
        if let Some(file) = self.file.take() {
            drop(file);
            log::debug!("closed '{}'", self.path.display());
        }
    }
}

impl Drop for InputDevice {
    fn drop(&mut self) {
        self.close();
    }
}

/// Iterator over the events of an [`InputDevice`].
///
/// Returned by [`InputDevice::events`]. Ends when a read yields no event. If the device is in
/// blocking mode, each call to [`Iterator::next`] blocks until an event arrives.
#[derive(Debug)]
pub struct Events<'a> {
    dev: &'a InputDevice,
}

impl Iterator for Events<'_> {
    type Item = Result<InputEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.dev.try_read().transpose()
    }
}
