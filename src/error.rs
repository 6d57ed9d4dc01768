//! Errors reported by the driver.

/// An error from the driver.
///
/// The chip never acknowledges a transfer, so a malformed transaction cannot be detected here.
/// What can be detected is a bad argument, which is always reported before the bus is touched,
/// and an error surfaced by one of the pins themselves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error<E> {
    /// A pin reported an error. The transfer stopped at the failing pin operation.
    Pin(E),
    /// A buffer of the wrong length, or a display memory address outside the chip's range.
    InvalidArgument,
}

impl<E> From<E> for Error<E> {
    fn from(error: E) -> Self {
        Error::Pin(error)
    }
}
