use evdev_core::{
    Error, EventType, InputDevice, InputId, Result, VirtualDevice, event::KeyState,
    uinput::{AxisRange, Capability},
};

use crate::{
    BTN_TRIGGER_HAPPY1, INPUT_ID, REL_DIAL, Tester, assert_frame, init_logger, open_evdev,
    unique_name,
};

/// Opens a fresh virtual device, or returns `None` if uinput is unavailable.
fn open_uinput() -> Result<Option<VirtualDevice>> {
    init_logger();
    match VirtualDevice::open() {
        Ok(dev) => Ok(Some(dev)),
        Err(Error::OpenFailed { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

#[test]
fn activated_device_rejects_configuration() -> Result<()> {
    let Some(mut t) = Tester::get() else {
        return Ok(());
    };

    assert!(t.uinput.is_active());
    match t.uinput.declare_key(BTN_TRIGGER_HAPPY1) {
        Err(Error::AlreadyActivated) => {}
        res => panic!("unexpected result: {res:?}"),
    }
    match t.uinput.set_input_id(InputId::default()) {
        Err(Error::AlreadyActivated) => {}
        res => panic!("unexpected result: {res:?}"),
    }
    match t.uinput.activate("again") {
        Err(Error::AlreadyActivated) => {}
        res => panic!("unexpected result: {res:?}"),
    }
    Ok(())
}

#[test]
fn sysname() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    let sysname = t.uinput.sysname()?;
    assert!(
        sysname.as_encoded_bytes().starts_with(b"input"),
        "unexpected sysname {sysname:?}"
    );
    let path = t.uinput.evdev_path()?.expect("device should have an event node");
    assert_eq!(path, t.evdev.path());
    Ok(())
}

#[test]
fn grab() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    let other = InputDevice::open(t.evdev.path(), false)?;
    assert!(!other.is_writable());

    assert!(t.evdev.grab(true)?);
    // a second grab on another handle is refused, not an error
    assert!(!other.grab(true)?);

    // only the grabbing handle receives events
    t.emit(&[(EventType::REL, REL_DIAL, 1)])?;
    assert_frame(&t.read_frame()?, &[(EventType::REL, REL_DIAL, 1)]);
    assert!(!other.is_readable()?);

    assert!(t.evdev.ungrab()?);
    assert!(other.grab(true)?);
    assert!(other.ungrab()?);
    Ok(())
}

#[test]
fn builder_sets_name_and_id() -> Result<()> {
    init_logger();
    let builder = match VirtualDevice::builder() {
        Ok(b) => b,
        Err(Error::OpenFailed { .. }) => return Ok(()),
        Err(e) => return Err(e),
    };

    let name = unique_name("rust-builder-test");
    let mut uinput = builder
        .with_input_id(INPUT_ID)?
        .with_keys([BTN_TRIGGER_HAPPY1])?
        .with_codes(Capability::Misc, [0x04])?
        .with_abs_axes([(0x0b, AxisRange::new(-10, 10).with_flat(2))])?
        .build(&name)?;
    assert!(uinput.is_active());

    let mut evdev = open_evdev(&uinput)?;
    assert_eq!(evdev.name()?, name);

    for state in [KeyState::PRESSED, KeyState::RELEASED] {
        uinput.write(EventType::KEY, BTN_TRIGGER_HAPPY1, state.raw())?;
        uinput.sync()?;
        let ev = evdev.read()?;
        assert_eq!((ev.raw_code(), ev.raw_value()), (BTN_TRIGGER_HAPPY1, state.raw()));
        assert_eq!(evdev.read()?.event_type(), EventType::SYN);
    }

    uinput.close();
    assert!(uinput.is_closed());
    match uinput.sync() {
        Err(Error::UseAfterClose) => {}
        res => panic!("unexpected result: {res:?}"),
    }

    evdev.close();
    match evdev.read() {
        Err(Error::UseAfterClose) => {}
        res => panic!("unexpected result: {res:?}"),
    }
    Ok(())
}

#[test]
fn long_names_are_truncated() -> Result<()> {
    let Some(mut uinput) = open_uinput()? else {
        return Ok(());
    };

    let name = unique_name(&"x".repeat(100));
    uinput.declare_rel_axis(REL_DIAL, 0, 0)?;
    uinput.activate(&name)?;

    let evdev = open_evdev(&uinput)?;
    assert_eq!(evdev.name()?, name[..80]);
    Ok(())
}

#[test]
fn default_name() -> Result<()> {
    let Some(mut uinput) = open_uinput()? else {
        return Ok(());
    };

    uinput.declare_key(BTN_TRIGGER_HAPPY1)?;
    uinput.activate_default()?;
    let evdev = open_evdev(&uinput)?;
    assert_eq!(evdev.name()?, evdev_core::uinput::DEFAULT_NAME);
    Ok(())
}

#[test]
fn invalid_axis_range() -> Result<()> {
    let Some(mut uinput) = open_uinput()? else {
        return Ok(());
    };

    // ABS_X with minimum above maximum
    uinput.declare_abs_axis(0x00, 10, 0)?;
    match uinput.activate(&unique_name("rust-invalid-range")) {
        Err(Error::ActivationFailed(_)) => {}
        res => panic!("unexpected result: {res:?}"),
    }
    assert!(!uinput.is_active());
    assert!(!uinput.is_closed());

    uinput.close();
    assert!(uinput.is_closed());
    Ok(())
}
