//! The MDU1093 board: a TM1638 driving eight seven-segment digits and eight discrete LEDs, with
//! a key matrix on the scan lines.

use hal::blocking::delay::DelayUs;
use hal::digital::v2::{InputPin, OutputPin};

use crate::command::consts::*;
use crate::config::Config;
use crate::driver::Tm1638;
use crate::error::Error;
use crate::interface::ConfigurablePin;
use crate::keys::KeyScan;

/// Number of seven-segment digits on the board.
pub const NUM_DIGITS: usize = 8;

/// A driver for the MDU1093 board.
pub struct Mdu1093<STB, CLK, DIO, D> {
    /// Bitmap of the discrete LEDs.
    led: u8,
    /// One byte per seven-segment digit.
    // TODO: mirror writes made through `driver()` here once the board grows digit rendering.
    display_memory: [u8; NUM_DIGITS],
    /// Last brightness level sent to the chip.
    brightness: u8,
    /// Result of the last key scan.
    key_buffer: [u8; KEY_SCAN_BYTES],
    ic: Tm1638<STB, CLK, DIO, D>,
}

impl<STB, CLK, DIO, D, E> Mdu1093<STB, CLK, DIO, D>
where
    STB: OutputPin<Error = E> + ConfigurablePin<Error = E>,
    CLK: OutputPin<Error = E> + ConfigurablePin<Error = E>,
    DIO: OutputPin<Error = E> + InputPin<Error = E> + ConfigurablePin<Error = E>,
    D: DelayUs<u32>,
{
    /// Construct a board driver at full brightness. Nothing is sent until `configure`.
    pub fn new(strobe: STB, clock: CLK, data: DIO, delay: D) -> Self {
        Self::with_config(strobe, clock, data, delay, Config::default())
    }

    /// Construct a board driver with an explicit `Config`. Nothing is sent until `configure`.
    pub fn with_config(strobe: STB, clock: CLK, data: DIO, delay: D, config: Config) -> Self {
        Mdu1093 {
            led: 0,
            display_memory: [0; NUM_DIGITS],
            brightness: config.initial_brightness(),
            key_buffer: [0; KEY_SCAN_BYTES],
            ic: Tm1638::new(strobe, clock, data, delay),
        }
    }

    /// Give back the pins and the delay.
    pub fn destroy(self) -> (STB, CLK, DIO, D) {
        self.ic.destroy()
    }

    /// Configure the pins and push the configured brightness to the chip.
    pub fn configure(&mut self) -> Result<(), Error<E>> {
        self.ic.configure()?;
        self.ic.set_display_brightness(self.brightness)
    }

    /// Change the display brightness. See `Tm1638::set_display_brightness`.
    pub fn set_brightness(&mut self, brightness: u8) -> Result<(), Error<E>> {
        self.brightness = brightness.min(MAX_BRIGHTNESS);
        self.ic.set_display_brightness(self.brightness)
    }

    /// Scan the keys.
    pub fn read_keys(&mut self) -> Result<KeyScan, Error<E>> {
        self.ic.read_keyboard(&mut self.key_buffer)?;
        Ok(KeyScan::new(self.key_buffer))
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn leds(&self) -> u8 {
        self.led
    }

    pub fn display_memory(&self) -> &[u8; NUM_DIGITS] {
        &self.display_memory
    }

    /// Direct access to the chip, for writing display memory.
    pub fn driver(&mut self) -> &mut Tm1638<STB, CLK, DIO, D> {
        &mut self.ic
    }
}
