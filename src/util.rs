use std::{
    ffi::{c_char, c_int},
    fs::File,
    io,
    os::fd::{AsFd, AsRawFd},
};

use uoctl::Ioctl;

use crate::error::IoctlError;

/// Uses `poll(2)` to determine whether reading from `fd` is possible without blocking.
pub fn is_readable(fd: impl AsFd) -> io::Result<bool> {
    let mut poll = libc::pollfd {
        fd: fd.as_fd().as_raw_fd(),
        events: libc::POLLIN,
        revents: 0,
    };
    let ret = unsafe { libc::poll(&mut poll, 1, 0) };
    if ret == -1 {
        return Err(io::Error::last_os_error());
    }

    Ok(poll.revents & libc::POLLIN != 0)
}

/// Sets or clears `O_NONBLOCK`, returning whether it was set before.
pub fn set_nonblocking(fd: impl AsFd, nonblocking: bool) -> io::Result<bool> {
    let fd = fd.as_fd().as_raw_fd();
    let flags = unsafe { libc::fcntl(fd, libc::F_GETFL) };
    if flags == -1 {
        return Err(io::Error::last_os_error());
    }

    let was_nonblocking = flags & libc::O_NONBLOCK != 0;
    let new_flags = if nonblocking {
        flags | libc::O_NONBLOCK
    } else {
        flags & !libc::O_NONBLOCK
    };

    if new_flags != flags {
        let ret = unsafe { libc::fcntl(fd, libc::F_SETFL, new_flags) };
        if ret == -1 {
            return Err(io::Error::last_os_error());
        }
    }
    Ok(was_nonblocking)
}

/// Executes `ioctl` on `file` and adds the request name to the error.
pub unsafe fn ioctl<T>(
    file: &File,
    name: &'static str,
    ioctl: Ioctl<T>,
    arg: T,
) -> io::Result<c_int> {
    unsafe { ioctl.ioctl(file, arg) }.map_err(|e| IoctlError::wrap(name, e))
}

/// Fetches a string via one of the "copy a string into this buffer" ioctls.
pub unsafe fn fetch_string(
    file: &File,
    name: &'static str,
    ioctl: fn(usize) -> Ioctl<*mut c_char>,
) -> io::Result<Vec<u8>> {
    // These ioctls return the number of bytes copied, which is at most the buffer length. If the
    // buffer was filled completely, the string may have been cut off, so retry with a bigger one.
    const INITIAL_LEN: usize = 64;
    let mut buf = vec![0_u8; INITIAL_LEN];
    let len = loop {
        let len = unsafe { self::ioctl(file, name, ioctl(buf.len()), buf.as_mut_ptr().cast())? };
        if len as usize == buf.len() {
            buf.resize(buf.len() * 2, 0);
        } else {
            break len;
        }
    };

    // `len` includes the trailing 0 byte
    buf.truncate(len.saturating_sub(1) as usize);
    Ok(buf)
}
