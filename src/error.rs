//! Error types for the driver.

use core::fmt;

use crate::pins::PinLine;

/// Errors reported by construction and by the [`Lcd`](crate::lcd::Lcd) session.
///
/// Bus write failures are not part of this enum: they stay inside the
/// [`Dispatcher`](crate::dispatcher::Dispatcher), which logs and counts them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// A pin position does not fit in the bus byte (must be 0..=7).
    PinOutOfRange {
        /// The offending signal line
        line: PinLine,
        /// The position it was given
        position: u8,
    },
    /// Two signal lines were wired to the same bit.
    PinOverlap {
        /// The line that was checked
        line: PinLine,
        /// The line already holding that bit
        other: PinLine,
        /// The shared bit position
        position: u8,
    },
    /// The I2C address is not a usable 7-bit device address.
    InvalidAddress(u8),
    /// CGRAM holds 8 custom characters, index must be 0..=7.
    GraphIndexOutOfRange(u8),
    /// The session was closed, the dispatcher no longer accepts writes.
    Closed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PinOutOfRange { line, position } => {
                write!(f, "pin {line:?} at bit {position} is outside 0..=7")
            }
            Error::PinOverlap {
                line,
                other,
                position,
            } => write!(f, "pin {line:?} shares bit {position} with {other:?}"),
            Error::InvalidAddress(addr) => write!(f, "invalid I2C address {addr:#04x}"),
            Error::GraphIndexOutOfRange(index) => {
                write!(f, "CGRAM index {index} out of range, only 8 graphs allowed")
            }
            Error::Closed => f.write_str("display session is closed"),
        }
    }
}
