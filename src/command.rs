//! The command set for the TM1638.
//!
//! Every command is a single byte sent as the first byte of a transaction. Two of them carry a
//! parameter in their low bits: the display control command holds the brightness in bits 0-2, and
//! the address command holds the display memory address in bits 0-3.

/// Numeric values of the command bytes and the chip's limits.
pub mod consts {
    /// Data command: write display memory with the address incremented after each byte.
    pub const CMD_ADDRESS_AUTO_INCREMENT: u8 = 0x40;
    /// Data command: write display memory at a fixed address.
    pub const CMD_FIXED_ADDRESS: u8 = 0x44;
    /// Data command: read the key scan matrix.
    pub const CMD_READ_KEY_SCAN: u8 = 0x42;
    /// Display control command with the display switched off.
    pub const CMD_DISPLAY_OFF: u8 = 0x80;
    /// Display control command with the display switched on. Bits 0-2 hold the brightness.
    pub const CMD_SET_BRIGHTNESS: u8 = 0x88;
    /// Address command. Bits 0-3 hold the display memory address.
    pub const CMD_SET_ADDRESS: u8 = 0xC0;

    /// Highest display memory address.
    pub const MAX_ADDRESS: u8 = 0x0F;
    /// Highest brightness level.
    pub const MAX_BRIGHTNESS: u8 = 0x07;

    /// Number of display memory cells, one per address.
    pub const NUM_MEMORY_CELLS: usize = MAX_ADDRESS as usize + 1;
    /// Number of bytes returned by a key scan read.
    pub const KEY_SCAN_BYTES: usize = 4;

    /// Minimum time in microseconds between two pin changes the chip has to observe.
    pub const TRANSMISSION_DELAY_US: u32 = 5;
}

use self::consts::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    /// Following data bytes are written to consecutive display memory addresses, starting at the
    /// address given by `SetAddress`.
    AddressAutoIncrement,
    /// Following data bytes are all written to the address given by `SetAddress`.
    FixedAddress,
    /// The chip drives the key scan matrix onto DIO for the rest of the transaction. See
    /// `Tm1638::read_keyboard`.
    ReadKeyScan,
    /// Switch the display off.
    DisplayOff,
    /// Switch the display on at a brightness level. Range is 0-7.
    SetBrightness(u8),
    /// Set the display memory address for the next data byte. Range is 0-15.
    SetAddress(u8),
}

impl Command {
    /// Encode the command as the byte sent on the wire. Fails if the parameter is out of range.
    pub fn encode(self) -> Result<u8, ()> {
        match self {
            Command::AddressAutoIncrement => Ok(CMD_ADDRESS_AUTO_INCREMENT),
            Command::FixedAddress => Ok(CMD_FIXED_ADDRESS),
            Command::ReadKeyScan => Ok(CMD_READ_KEY_SCAN),
            Command::DisplayOff => Ok(CMD_DISPLAY_OFF),
            Command::SetBrightness(level) => match level {
                0..=MAX_BRIGHTNESS => Ok(CMD_SET_BRIGHTNESS | level),
                _ => Err(()),
            },
            Command::SetAddress(address) => match address {
                0..=MAX_ADDRESS => Ok(CMD_SET_ADDRESS | address),
                _ => Err(()),
            },
        }
    }
}
