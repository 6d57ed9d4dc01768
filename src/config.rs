//! Board configuration applied when the board is configured.

use crate::command::consts::MAX_BRIGHTNESS;

/// A configuration for the board. Builder methods override the defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    brightness: u8,
}

impl Config {
    /// Create a new configuration with the display at full brightness.
    pub fn new() -> Self {
        Config {
            brightness: MAX_BRIGHTNESS,
        }
    }

    /// Extend this `Config` with the brightness pushed to the chip by `Mdu1093::configure`. Zero
    /// leaves the display off, and values above `MAX_BRIGHTNESS` are treated as
    /// `MAX_BRIGHTNESS`. See `Tm1638::set_display_brightness`.
    pub fn brightness(self, brightness: u8) -> Self {
        Self {
            brightness: brightness.min(MAX_BRIGHTNESS),
            ..self
        }
    }

    pub(crate) fn initial_brightness(&self) -> u8 {
        self.brightness
    }
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}
