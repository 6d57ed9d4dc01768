//! Driver library for the Titan Micro TM1638 LED driver and key scan controller, and for the
//! MDU1093 board built around it.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate embedded_hal as hal;

pub mod board;
pub mod command;
pub mod config;
pub mod driver;
pub mod error;
pub mod interface;
pub mod keys;

// Re-exports for primary API.
pub use board::Mdu1093;
pub use command::{consts, Command};
pub use config::Config;
pub use driver::Tm1638;
pub use error::Error;
pub use interface::{ConfigurablePin, Direction};
pub use keys::{Key, KeyScan};
