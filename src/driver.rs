//! The protocol driver for the TM1638. It bit-bangs the chip's serial protocol over the STB, CLK
//! and DIO lines.
//!
//! A transaction starts with STB pulled low (`open`) and ends with STB released high (`close`).
//! Inside it, bytes are shifted least significant bit first: DIO is changed while CLK is low and
//! the chip latches it on the rising edge. Every line change is followed by a transmission delay
//! of at least `TRANSMISSION_DELAY_US`.
//!
//! The chip never acknowledges anything, so apart from argument checks done before the bus is
//! touched, every operation is a fixed sequence of pin changes. Transactions must not nest, and
//! if the driver is shared between tasks, each `open`..`close` sequence has to be guarded by the
//! caller.

use core::convert::TryInto;

use hal::blocking::delay::DelayUs;
use hal::digital::v2::{InputPin, OutputPin};
use log::{debug, trace};

use crate::command::consts::*;
use crate::command::Command;
use crate::error::Error;
use crate::interface::{ConfigurablePin, Direction};

/// A driver for a TM1638 connected to three GPIO lines.
pub struct Tm1638<STB, CLK, DIO, D> {
    /// STB. The chip accepts a transmission while this line is low.
    strobe: STB,
    /// CLK. The chip reads DIO on the rising edge and drives it on the falling edge.
    clock: CLK,
    /// DIO. Serial data in both directions.
    data: DIO,
    delay: D,
}

impl<STB, CLK, DIO, D, E> Tm1638<STB, CLK, DIO, D>
where
    STB: OutputPin<Error = E> + ConfigurablePin<Error = E>,
    CLK: OutputPin<Error = E> + ConfigurablePin<Error = E>,
    DIO: OutputPin<Error = E> + InputPin<Error = E> + ConfigurablePin<Error = E>,
    D: DelayUs<u32>,
{
    /// Construct a driver from the strobe, clock and data lines, and a delay used to time the
    /// protocol. Nothing is done to the pins until `configure` is called.
    pub fn new(strobe: STB, clock: CLK, data: DIO, delay: D) -> Self {
        Tm1638 {
            strobe,
            clock,
            data,
            delay,
        }
    }

    /// Give back the pins and the delay.
    pub fn destroy(self) -> (STB, CLK, DIO, D) {
        (self.strobe, self.clock, self.data, self.delay)
    }

    /// Set all three lines to outputs. Must be called before any transfer; calling it again has
    /// no further effect.
    pub fn configure(&mut self) -> Result<(), Error<E>> {
        self.strobe.configure(Direction::Output)?;
        self.clock.configure(Direction::Output)?;
        self.data.configure(Direction::Output)?;
        debug!("tm1638: pins configured");
        Ok(())
    }

    /// Start a transaction.
    pub fn open(&mut self) -> Result<(), Error<E>> {
        self.strobe.set_low()?;
        self.transmission_delay();
        Ok(())
    }

    /// End a transaction.
    pub fn close(&mut self) -> Result<(), Error<E>> {
        self.strobe.set_high()?;
        self.transmission_delay();
        Ok(())
    }

    /// Shift one byte out to the chip, least significant bit first. Must be called inside an
    /// open transaction.
    pub fn send_byte(&mut self, value: u8) -> Result<(), Error<E>> {
        for bit in 0..8 {
            self.clock.set_low()?;
            self.transmission_delay();
            if value & (1 << bit) != 0 {
                self.data.set_high()?;
            } else {
                self.data.set_low()?;
            }
            self.transmission_delay();
            self.clock.set_high()?;
            self.transmission_delay();
        }
        Ok(())
    }

    /// Send a single command byte in a transaction of its own.
    pub fn send_command(&mut self, command: Command) -> Result<(), Error<E>> {
        let byte = command.encode().map_err(|_| Error::InvalidArgument)?;
        self.transaction(|tm| tm.send_byte(byte))
    }

    /// Read the key scan matrix into `buffer` in a single transaction. DIO is switched to an
    /// input while the chip shifts out its 4 bytes, and is back to an output on return. See
    /// `keys::KeyScan` for the meaning of the bits.
    pub fn read_keyboard(&mut self, buffer: &mut [u8; KEY_SCAN_BYTES]) -> Result<(), Error<E>> {
        let command = Command::ReadKeyScan
            .encode()
            .map_err(|_| Error::InvalidArgument)?;
        self.transaction(|tm| {
            tm.send_byte(command)?;
            tm.data.configure(Direction::Input)?;
            tm.transmission_delay();

            // DIO goes back to an output even if the scan itself failed midway.
            let scanned = tm.clock_in(buffer);
            let restored = tm.data.configure(Direction::Output);
            scanned?;
            restored?;
            trace!("tm1638: key scan {:02x?}", buffer);
            Ok(())
        })
    }

    /// Like `read_keyboard`, for callers holding a slice. The slice must be exactly
    /// `KEY_SCAN_BYTES` long, which is checked before the bus is touched.
    pub fn read_keyboard_into(&mut self, buffer: &mut [u8]) -> Result<(), Error<E>> {
        let buffer: &mut [u8; KEY_SCAN_BYTES] =
            buffer.try_into().map_err(|_| Error::InvalidArgument)?;
        self.read_keyboard(buffer)
    }

    /// Set the display brightness. Zero switches the display off; anything above
    /// `MAX_BRIGHTNESS` is treated as `MAX_BRIGHTNESS`.
    pub fn set_display_brightness(&mut self, value: u8) -> Result<(), Error<E>> {
        let command = match value {
            0 => Command::DisplayOff,
            1..=MAX_BRIGHTNESS => Command::SetBrightness(value),
            _ => {
                debug!(
                    "tm1638: brightness {} clamped to {}",
                    value, MAX_BRIGHTNESS
                );
                Command::SetBrightness(MAX_BRIGHTNESS)
            }
        };
        debug!("tm1638: display control {:?}", command);
        self.send_command(command)
    }

    /// Zero all 16 display memory cells, blanking every segment and LED.
    pub fn clear_display_memory(&mut self) -> Result<(), Error<E>> {
        self.write_display_memory(0, &[0; NUM_MEMORY_CELLS])
    }

    /// Write `data` into consecutive display memory cells starting at `start`, using address
    /// auto-increment mode. The whole range must lie within the 16 cells.
    pub fn write_display_memory(&mut self, start: u8, data: &[u8]) -> Result<(), Error<E>> {
        if start as usize + data.len() > NUM_MEMORY_CELLS {
            return Err(Error::InvalidArgument);
        }
        let set_address = Command::SetAddress(start)
            .encode()
            .map_err(|_| Error::InvalidArgument)?;

        self.send_command(Command::AddressAutoIncrement)?;
        self.transaction(|tm| {
            tm.send_byte(set_address)?;
            for &byte in data {
                tm.send_byte(byte)?;
            }
            Ok(())
        })
    }

    /// Write one byte to the display memory cell at `address`, using fixed address mode.
    pub fn write_fixed(&mut self, address: u8, value: u8) -> Result<(), Error<E>> {
        let set_address = Command::SetAddress(address)
            .encode()
            .map_err(|_| Error::InvalidArgument)?;

        self.send_command(Command::FixedAddress)?;
        self.transaction(|tm| {
            tm.send_byte(set_address)?;
            tm.send_byte(value)
        })
    }

    /// Run `body` between `open` and `close`. STB is released even if `body` fails, and the
    /// first error is returned.
    fn transaction<F>(&mut self, body: F) -> Result<(), Error<E>>
    where
        F: FnOnce(&mut Self) -> Result<(), Error<E>>,
    {
        self.open()?;
        let result = body(self);
        let closed = self.close();
        result.and(closed)
    }

    /// Shift in the chip's key scan response. DIO must already be an input.
    fn clock_in(&mut self, buffer: &mut [u8; KEY_SCAN_BYTES]) -> Result<(), Error<E>> {
        for slot in buffer.iter_mut() {
            let mut element = 0u8;
            for bit in 0..8 {
                self.clock.set_low()?;
                self.transmission_delay();
                if self.data.is_high()? {
                    element |= 1 << bit;
                }
                self.transmission_delay();
                self.clock.set_high()?;
                self.transmission_delay();
            }
            *slot = element;
        }
        Ok(())
    }

    /// Wait long enough for the chip to observe the last line change. This is a lower bound; a
    /// delay implementation may wait longer but never shorter.
    fn transmission_delay(&mut self) {
        self.delay.delay_us(TRANSMISSION_DELAY_US);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interface::test_spy::{Event, Line, SpyDelay, SpyFault, SpyPin, TestSpyBus};
    use std::vec::Vec;

    type SpyDriver = Tm1638<SpyPin, SpyPin, SpyPin, SpyDelay>;

    fn driver(bus: &TestSpyBus) -> SpyDriver {
        let (strobe, clock, data, delay) = bus.split();
        Tm1638::new(strobe, clock, data, delay)
    }

    #[test]
    fn configure_sets_outputs() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.configure().unwrap();
        assert_eq!(
            bus.events(),
            vec![
                Event::Configure(Line::Strobe, Direction::Output),
                Event::Configure(Line::Clock, Direction::Output),
                Event::Configure(Line::Data, Direction::Output),
            ]
        );
    }

    #[test]
    fn configure_is_idempotent() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.configure().unwrap();
        let once = bus.events();
        bus.clear();
        tm.configure().unwrap();
        tm.configure().unwrap();
        let events = bus.events();
        assert_eq!(&events[..3], &once[..]);
        assert_eq!(&events[3..], &once[..]);
        assert_eq!(bus.data_direction(), Some(Direction::Output));
    }

    #[test]
    fn open_close() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.open().unwrap();
        tm.close().unwrap();
        assert_eq!(
            bus.events(),
            vec![
                Event::Set(Line::Strobe, false),
                Event::Delay(5),
                Event::Set(Line::Strobe, true),
                Event::Delay(5),
            ]
        );
    }

    #[test]
    fn send_byte_framing() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.send_byte(0b0000_0001).unwrap();
        let events = bus.events();
        assert_eq!(events.len(), 8 * 6);
        assert_eq!(
            &events[..12],
            &[
                Event::Set(Line::Clock, false), Event::Delay(5),
                Event::Set(Line::Data, true), Event::Delay(5),
                Event::Set(Line::Clock, true), Event::Delay(5),
                Event::Set(Line::Clock, false), Event::Delay(5),
                Event::Set(Line::Data, false), Event::Delay(5),
                Event::Set(Line::Clock, true), Event::Delay(5),
            ]
        );
    }

    #[test]
    fn send_byte_every_value() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        for value in 0..=255u8 {
            bus.clear();
            tm.send_byte(value).unwrap();
            let events = bus.events();
            let rising_edges = events
                .iter()
                .filter(|e| **e == Event::Set(Line::Clock, true))
                .count();
            assert_eq!(rising_edges, 8);
            // Bit i is put on DIO during the low phase of the i-th clock pulse.
            let bits = events
                .chunks(6)
                .map(|pulse| {
                    assert_eq!(pulse[0], Event::Set(Line::Clock, false));
                    assert_eq!(pulse[4], Event::Set(Line::Clock, true));
                    pulse[2] == Event::Set(Line::Data, true)
                })
                .collect::<Vec<_>>();
            for (i, bit) in bits.iter().enumerate() {
                assert_eq!(*bit, value & (1 << i) != 0, "value {:#04x} bit {}", value, i);
            }
        }
    }

    #[test]
    fn send_byte_in_transaction() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.open().unwrap();
        tm.send_byte(0xA5).unwrap();
        tm.send_byte(0x3C).unwrap();
        tm.close().unwrap();
        assert_eq!(bus.transactions(), vec![vec![0xA5, 0x3C]]);
    }

    #[test]
    fn brightness_zero_turns_display_off() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.set_display_brightness(0).unwrap();
        assert_eq!(bus.transactions(), vec![vec![0x80]]);
    }

    #[test]
    fn brightness_levels() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        for level in 1..=7u8 {
            bus.clear();
            tm.set_display_brightness(level).unwrap();
            assert_eq!(bus.transactions(), vec![vec![0x88 | level]]);
        }
    }

    #[test]
    fn brightness_is_clamped() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.set_display_brightness(8).unwrap();
        tm.set_display_brightness(200).unwrap();
        assert_eq!(bus.transactions(), vec![vec![0x8F], vec![0x8F]]);
    }

    #[test]
    fn clear_display_memory() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.clear_display_memory().unwrap();
        let mut expected = vec![0xC0];
        expected.extend_from_slice(&[0; 16]);
        assert_eq!(bus.transactions(), vec![vec![0x40], expected]);
    }

    #[test]
    fn write_display_memory() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.write_display_memory(2, &[0x3F, 0x06, 0x5B]).unwrap();
        assert_eq!(
            bus.transactions(),
            vec![vec![0x40], vec![0xC2, 0x3F, 0x06, 0x5B]]
        );

        bus.clear();
        tm.write_display_memory(15, &[0x01]).unwrap();
        assert_eq!(bus.transactions(), vec![vec![0x40], vec![0xCF, 0x01]]);
    }

    #[test]
    fn write_display_memory_out_of_range() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        assert_eq!(
            tm.write_display_memory(10, &[0; 7]),
            Err(Error::InvalidArgument)
        );
        assert_eq!(tm.write_display_memory(16, &[]), Err(Error::InvalidArgument));
        assert_eq!(bus.events(), vec![]);
    }

    #[test]
    fn write_fixed() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.write_fixed(3, 0x7F).unwrap();
        assert_eq!(bus.transactions(), vec![vec![0x44], vec![0xC3, 0x7F]]);
        assert_eq!(tm.write_fixed(16, 0x7F), Err(Error::InvalidArgument));
    }

    #[test]
    fn invalid_command_touches_nothing() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        assert_eq!(
            tm.send_command(Command::SetAddress(0x10)),
            Err(Error::InvalidArgument)
        );
        assert_eq!(
            tm.send_command(Command::SetBrightness(8)),
            Err(Error::InvalidArgument)
        );
        assert_eq!(bus.events(), vec![]);
    }

    #[test]
    fn read_keyboard() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.configure().unwrap();
        bus.clear();
        bus.reply(&[0xFF, 0x00, 0xAA, 0x55]);

        let mut buffer = [0u8; 4];
        tm.read_keyboard(&mut buffer).unwrap();
        assert_eq!(buffer, [0xFF, 0x00, 0xAA, 0x55]);
        assert_eq!(bus.transactions(), vec![vec![0x42, 0xFF, 0x00, 0xAA, 0x55]]);
        assert_eq!(bus.data_direction(), Some(Direction::Output));

        // DIO is released only after the command byte has been shifted out, and taken back
        // before the transaction is closed.
        let events = bus.events();
        let to_input = events
            .iter()
            .position(|e| *e == Event::Configure(Line::Data, Direction::Input))
            .unwrap();
        let to_output = events
            .iter()
            .position(|e| *e == Event::Configure(Line::Data, Direction::Output))
            .unwrap();
        let close = events
            .iter()
            .rposition(|e| *e == Event::Set(Line::Strobe, true))
            .unwrap();
        let first_sample = events
            .iter()
            .position(|e| matches!(e, Event::Sample(_)))
            .unwrap();
        assert_eq!(events[to_input + 1], Event::Delay(5));
        assert!(to_input < first_sample);
        assert!(to_output < close);
        let samples = events
            .iter()
            .filter(|e| matches!(e, Event::Sample(_)))
            .count();
        assert_eq!(samples, 32);
    }

    #[test]
    fn read_keyboard_overwrites_buffer() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        bus.reply(&[0x00, 0x24, 0x00, 0x02]);
        let mut buffer = [0xEE; 4];
        tm.read_keyboard(&mut buffer).unwrap();
        assert_eq!(buffer, [0x00, 0x24, 0x00, 0x02]);
    }

    #[test]
    fn read_keyboard_into_checks_length() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        let mut short = [0u8; 3];
        let mut long = [0u8; 5];
        assert_eq!(tm.read_keyboard_into(&mut short), Err(Error::InvalidArgument));
        assert_eq!(tm.read_keyboard_into(&mut long), Err(Error::InvalidArgument));
        assert_eq!(bus.events(), vec![]);

        bus.reply(&[0x11, 0x22, 0x33, 0x44]);
        let mut exact = [0u8; 4];
        tm.read_keyboard_into(&mut exact[..]).unwrap();
        assert_eq!(exact, [0x11, 0x22, 0x33, 0x44]);
    }

    #[test]
    fn failed_scan_restores_data_and_closes() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.configure().unwrap();
        bus.fail_samples();

        let mut buffer = [0u8; 4];
        assert_eq!(tm.read_keyboard(&mut buffer), Err(Error::Pin(SpyFault)));
        assert_eq!(bus.data_direction(), Some(Direction::Output));
        assert!(bus
            .events()
            .contains(&Event::Configure(Line::Data, Direction::Input)));
        assert_eq!(bus.strobe_levels(), vec![false, true]);

        bus.repair();
        tm.set_display_brightness(3).unwrap();
        assert_eq!(bus.strobe_levels(), vec![false, true, false, true]);
        assert_eq!(bus.transactions().last(), Some(&vec![0x8B]));
    }

    #[test]
    fn failed_write_closes_transaction() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        bus.fail(Line::Clock);
        assert_eq!(tm.write_fixed(2, 0x7F), Err(Error::Pin(SpyFault)));
        assert_eq!(bus.strobe_levels(), vec![false, true]);

        bus.clear();
        bus.fail(Line::Data);
        assert_eq!(tm.send_command(Command::ReadKeyScan), Err(Error::Pin(SpyFault)));
        assert_eq!(bus.strobe_levels(), vec![false, true]);

        bus.clear();
        assert_eq!(
            tm.write_display_memory(0, &[1, 2]),
            Err(Error::Pin(SpyFault))
        );
        assert_eq!(bus.strobe_levels(), vec![false, true]);
    }

    #[test]
    fn transactions_never_nest() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.configure().unwrap();
        tm.set_display_brightness(4).unwrap();
        tm.clear_display_memory().unwrap();
        tm.write_fixed(0, 0x3F).unwrap();
        tm.read_keyboard(&mut [0; 4]).unwrap();
        tm.set_display_brightness(0).unwrap();

        let levels = bus.strobe_levels();
        assert!(!levels.is_empty());
        for pair in levels.windows(2) {
            assert_ne!(pair[0], pair[1]);
        }
        assert_eq!(levels.first(), Some(&false));
        assert_eq!(levels.last(), Some(&true));
    }

    #[test]
    fn every_wait_meets_minimum_delay() {
        let bus = TestSpyBus::new();
        let mut tm = driver(&bus);
        tm.clear_display_memory().unwrap();
        tm.read_keyboard(&mut [0; 4]).unwrap();
        let delays = bus
            .events()
            .into_iter()
            .filter_map(|e| match e {
                Event::Delay(us) => Some(us),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert!(!delays.is_empty());
        assert!(delays.iter().all(|&us| us >= TRANSMISSION_DELAY_US));
    }
}
