use std::time::{Duration, SystemTime};

use evdev_core::{EventType, InputEvent, Result, event::KeyState};

use crate::{ABS_BRAKE, BTN_TRIGGER_HAPPY1, BTN_TRIGGER_HAPPY2, REL_DIAL, Tester, assert_frame};

const PRESS: i32 = KeyState::PRESSED.raw();
const RELEASE: i32 = KeyState::RELEASED.raw();

#[test]
fn key_roundtrip() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    t.emit(&[(EventType::KEY, BTN_TRIGGER_HAPPY1, PRESS)])?;
    assert_frame(&t.read_frame()?, &[(EventType::KEY, BTN_TRIGGER_HAPPY1, PRESS)]);

    t.emit(&[(EventType::KEY, BTN_TRIGGER_HAPPY1, RELEASE)])?;
    assert_frame(&t.read_frame()?, &[(EventType::KEY, BTN_TRIGGER_HAPPY1, RELEASE)]);
    Ok(())
}

#[test]
fn frame_with_several_events() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    let press = [
        (EventType::KEY, BTN_TRIGGER_HAPPY1, PRESS),
        (EventType::KEY, BTN_TRIGGER_HAPPY2, PRESS),
        (EventType::REL, REL_DIAL, -3),
    ];
    t.emit(&press)?;
    assert_frame(&t.read_frame()?, &press);

    let release = [
        (EventType::KEY, BTN_TRIGGER_HAPPY1, RELEASE),
        (EventType::KEY, BTN_TRIGGER_HAPPY2, RELEASE),
    ];
    t.emit(&release)?;
    assert_frame(&t.read_frame()?, &release);
    Ok(())
}

#[test]
fn abs_roundtrip() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    t.emit(&[(EventType::ABS, ABS_BRAKE, 200)])?;
    assert_frame(&t.read_frame()?, &[(EventType::ABS, ABS_BRAKE, 200)]);

    // absolute axes only report changes
    t.emit(&[(EventType::ABS, ABS_BRAKE, 200)])?;
    assert!(!t.evdev.is_readable()?);

    t.emit(&[(EventType::ABS, ABS_BRAKE, 0)])?;
    assert_frame(&t.read_frame()?, &[(EventType::ABS, ABS_BRAKE, 0)]);
    Ok(())
}

#[test]
fn repeated_press_is_dropped() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    t.emit(&[(EventType::KEY, BTN_TRIGGER_HAPPY2, PRESS)])?;
    t.emit(&[(EventType::KEY, BTN_TRIGGER_HAPPY2, PRESS)])?;
    assert_frame(&t.read_frame()?, &[(EventType::KEY, BTN_TRIGGER_HAPPY2, PRESS)]);
    assert!(!t.evdev.is_readable()?);

    t.emit(&[(EventType::KEY, BTN_TRIGGER_HAPPY2, RELEASE)])?;
    assert_frame(&t.read_frame()?, &[(EventType::KEY, BTN_TRIGGER_HAPPY2, RELEASE)]);
    Ok(())
}

#[test]
fn undeclared_codes_are_dropped() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    // KEY_A was never declared
    t.emit(&[(EventType::KEY, 30, PRESS)])?;
    t.emit(&[(EventType::KEY, 30, RELEASE)])?;
    assert!(!t.evdev.is_readable()?);
    Ok(())
}

#[test]
fn kernel_sets_timestamps() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    let before = SystemTime::now() - Duration::from_secs(1);
    t.uinput
        .write_event(&InputEvent::new(EventType::REL, REL_DIAL, 1))?;
    t.uinput.sync()?;

    let ev = t.evdev.read()?;
    assert_eq!(ev.event_type(), EventType::REL);
    assert!(ev.time() >= before, "{ev:?} predates {before:?}");
    assert!(ev.timestamp() > 0.0);

    let report = t.evdev.read()?;
    assert_eq!(report.event_type(), EventType::SYN);
    assert_eq!(report.timestamp(), ev.timestamp());
    Ok(())
}

#[test]
fn nonblocking_read() -> Result<()> {
    let Some(t) = Tester::get() else {
        return Ok(());
    };

    assert!(!t.evdev.set_nonblocking(true)?);
    assert_eq!(t.evdev.try_read()?, None);
    assert_eq!(t.evdev.events().count(), 0);

    t.emit(&[(EventType::REL, REL_DIAL, 2)])?;
    let events: Vec<_> = t.evdev.events().collect::<Result<_>>()?;
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].raw_value(), 2);
    assert_eq!(events[1].event_type(), EventType::SYN);

    assert!(t.evdev.set_nonblocking(false)?);
    Ok(())
}
