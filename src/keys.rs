//! Decoding of the key scan matrix read by `Tm1638::read_keyboard`.
//!
//! The chip scans up to 24 keys, each wired between one of the scan lines KS1-KS8 and one of the
//! return lines K1-K3. The 4 bytes of a key scan hold two scan lines each:
//!
//! ```text
//!          | B0 | B1 | B2 | B3 | B4 | B5 | B6 | B7 |
//!          | K3 | K2 | K1 | -  | K3 | K2 | K1 | -  |
//! byte 1   |        KS1        |        KS2        |
//! byte 2   |        KS3        |        KS4        |
//! byte 3   |        KS5        |        KS6        |
//! byte 4   |        KS7        |        KS8        |
//! ```
//!
//! Bits 3 and 7 carry nothing and are ignored.

use itertools::iproduct;

use crate::command::consts::KEY_SCAN_BYTES;

pub const NUM_SCAN_LINES: u8 = 8;
pub const NUM_RETURN_LINES: u8 = 3;

/// A key, identified by its scan line `ks` (1-8) and return line `k` (1-3).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Key {
    pub ks: u8,
    pub k: u8,
}

/// The raw result of one key scan.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeyScan([u8; KEY_SCAN_BYTES]);

impl KeyScan {
    pub fn new(raw: [u8; KEY_SCAN_BYTES]) -> Self {
        KeyScan(raw)
    }

    pub fn raw(&self) -> [u8; KEY_SCAN_BYTES] {
        self.0
    }

    /// Whether the key at scan line `ks` and return line `k` is down. Positions outside the
    /// matrix are never pressed.
    pub fn is_pressed(&self, ks: u8, k: u8) -> bool {
        match (ks, k) {
            (1..=NUM_SCAN_LINES, 1..=NUM_RETURN_LINES) => {
                let byte = ((ks - 1) / 2) as usize;
                let nibble = if ks % 2 == 1 { 0 } else { 4 };
                self.0[byte] & (1 << (nibble + NUM_RETURN_LINES - k)) != 0
            }
            _ => false,
        }
    }

    /// The keys that are down, ordered by scan line and then return line.
    pub fn pressed(&self) -> impl Iterator<Item = Key> {
        let scan = *self;
        iproduct!(1..=NUM_SCAN_LINES, 1..=NUM_RETURN_LINES)
            .filter(move |&(ks, k)| scan.is_pressed(ks, k))
            .map(|(ks, k)| Key { ks, k })
    }

    /// All 24 key states packed into the low bits of a word, bit `(ks - 1) * 3 + (k - 1)` for
    /// each key.
    pub fn to_bits(&self) -> u32 {
        self.pressed().fold(0, |bits, key| {
            bits | 1 << ((key.ks - 1) * NUM_RETURN_LINES + (key.k - 1))
        })
    }
}

impl From<[u8; KEY_SCAN_BYTES]> for KeyScan {
    fn from(raw: [u8; KEY_SCAN_BYTES]) -> Self {
        KeyScan(raw)
    }
}
