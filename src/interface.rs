//! The pin interface. The TM1638 is driven over three GPIO lines: STB and CLK are only ever
//! outputs, while DIO is an output for everything except the response phase of a key scan read.
//!
//! `embedded-hal` covers driving and sampling the lines with `OutputPin` and `InputPin`, but has no
//! way to flip a pin's direction in place, so that capability is described by `ConfigurablePin`.

/// Direction of a GPIO line.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Output,
    Input,
}

/// A GPIO line whose direction can be changed after it has been handed to the driver.
pub trait ConfigurablePin {
    type Error;

    fn configure(&mut self, direction: Direction) -> Result<(), Self::Error>;
}
