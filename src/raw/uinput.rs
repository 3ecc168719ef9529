//! `linux/uinput.h`

use std::ffi::{c_char, c_int};

use uoctl::{_IO, _IOC, _IOC_READ, _IOW, Ioctl};

use super::input::{ABS_CNT, input_id};

pub const UINPUT_MAX_NAME_SIZE: usize = 80;

/// Legacy device description, written to the uinput fd before `UI_DEV_CREATE`.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct uinput_user_dev {
    pub name: [c_char; UINPUT_MAX_NAME_SIZE],
    pub id: input_id,
    pub ff_effects_max: u32,
    pub absmax: [i32; ABS_CNT],
    pub absmin: [i32; ABS_CNT],
    pub absfuzz: [i32; ABS_CNT],
    pub absflat: [i32; ABS_CNT],
}

pub const UINPUT_IOCTL_BASE: u8 = b'U';
pub const UI_DEV_CREATE: Ioctl = _IO(UINPUT_IOCTL_BASE, 1);
pub const UI_DEV_DESTROY: Ioctl = _IO(UINPUT_IOCTL_BASE, 2);

pub const UI_SET_EVBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 100).with_direct_arg();
pub const UI_SET_KEYBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 101).with_direct_arg();
pub const UI_SET_RELBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 102).with_direct_arg();
pub const UI_SET_ABSBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 103).with_direct_arg();
pub const UI_SET_MSCBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 104).with_direct_arg();
pub const UI_SET_LEDBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 105).with_direct_arg();
pub const UI_SET_SNDBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 106).with_direct_arg();
pub const UI_SET_SWBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 109).with_direct_arg();
pub const UI_SET_PROPBIT: Ioctl<c_int> = _IOW(UINPUT_IOCTL_BASE, 110).with_direct_arg();

pub const fn UI_GET_SYSNAME(len: usize) -> Ioctl<*mut c_char> {
    _IOC(_IOC_READ, UINPUT_IOCTL_BASE, 44, len)
}
