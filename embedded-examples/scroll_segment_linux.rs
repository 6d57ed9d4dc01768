//! Example walking a lit digit across a TM1638 module, wired to a Linux SBC's GPIO lines through
//! sysfs: GPIO 7 for STB, GPIO 9 for CLK and GPIO 8 for DIO.

extern crate linux_embedded_hal as linux_hal;
extern crate tm1638;

use std::thread;
use std::time::Duration;

use linux_hal::sysfs_gpio;
use linux_hal::{Delay, SysfsPin};
use tm1638::consts::{MAX_ADDRESS, MAX_BRIGHTNESS};
use tm1638::{ConfigurablePin, Direction, Tm1638};

/// A sysfs pin whose direction the driver can flip.
struct Pin(SysfsPin);

impl Pin {
    fn export(number: u64) -> Result<Self, sysfs_gpio::Error> {
        let pin = SysfsPin::new(number);
        pin.export()?;
        Ok(Pin(pin))
    }
}

impl ConfigurablePin for Pin {
    type Error = sysfs_gpio::Error;

    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error> {
        self.0.set_direction(match direction {
            Direction::Output => sysfs_gpio::Direction::Out,
            Direction::Input => sysfs_gpio::Direction::In,
        })
    }
}

impl embedded_hal::digital::v2::OutputPin for Pin {
    type Error = sysfs_gpio::Error;

    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high()
    }
}

impl embedded_hal::digital::v2::InputPin for Pin {
    type Error = sysfs_gpio::Error;

    fn is_high(&self) -> Result<bool, Self::Error> {
        self.0.is_high()
    }

    fn is_low(&self) -> Result<bool, Self::Error> {
        self.0.is_low()
    }
}

fn main() -> Result<(), tm1638::Error<sysfs_gpio::Error>> {
    let mut tm = Tm1638::new(Pin::export(7)?, Pin::export(9)?, Pin::export(8)?, Delay);
    tm.configure()?;
    tm.set_display_brightness(MAX_BRIGHTNESS)?;

    loop {
        for address in 0..MAX_ADDRESS {
            if address > 0 {
                tm.write_fixed(address - 1, 0x00)?;
            }
            tm.write_fixed(address, 0x7F)?;
            thread::sleep(Duration::from_millis(250));
        }
        thread::sleep(Duration::from_secs(1));
        tm.clear_display_memory()?;
    }
}
