//! Grabs an event device for a few seconds, printing the events it sends in the meantime.

use std::{env, process, thread, time::Duration};

use evdev_core::{InputDevice, Result};

fn main() -> Result<()> {
    env_logger::init();
    let dev = match &*env::args().skip(1).collect::<Vec<_>>() {
        [path] => InputDevice::open(path, false)?,
        _ => {
            eprintln!("usage: {} <evdev-path>", env!("CARGO_CRATE_NAME"));
            process::exit(1);
        }
    };

    println!("Grabbing '{}' for 3 seconds", dev.name()?);

    if !dev.grab(true)? {
        eprintln!("Device is grabbed by another process");
        process::exit(1);
    }
    dev.set_nonblocking(true)?;
    for _ in 0..30 {
        for res in dev.events() {
            println!("{:?}", res?);
        }
        thread::sleep(Duration::from_millis(100));
    }

    println!("Ungrabbing device");

    dev.ungrab()?;

    println!("Done!");
    Ok(())
}
