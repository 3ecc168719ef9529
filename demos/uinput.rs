//! Creates a uinput device and presses a button repeatedly.

use std::{thread, time::Duration};

use evdev_core::{EventType, Result, VirtualDevice, event::KeyState};

/// The key or button to press and release (`BTN_TRIGGER_HAPPY1`).
///
/// Set this to 30 (`KEY_A`) to make the effect visible in applications.
const KEY: u16 = 0x2c0;

fn main() -> Result<()> {
    env_logger::init();
    let dev = VirtualDevice::builder()?
        .with_keys([KEY])?
        .build("Rust UInput")?;

    match dev.evdev_path()? {
        Some(path) => println!("Created device at '{}'", path.display()),
        None => println!("Created device"),
    }

    loop {
        for state in [KeyState::PRESSED, KeyState::RELEASED] {
            dev.write(EventType::KEY, KEY, state.raw())?;
            dev.sync()?;
            println!("{state:?}");
            thread::sleep(Duration::from_millis(500));
        }
    }
}
