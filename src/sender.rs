//! Built-in sender
//! If you want to drive the LCD through another transport, you will need to
//! implement [`BusWriter`] trait

mod i2c_sender;

pub use i2c_sender::I2cSender;

/// [`BusWriter`] is the trait a sender should implement to put one expander
/// byte on the wire
///
/// Only the [`Dispatcher`](crate::dispatcher::Dispatcher) ever calls it. A
/// write is synchronous: the byte is on the bus when the call returns.
pub trait BusWriter {
    /// Transport error
    type Error;

    /// Write one byte to the preconfigured device
    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error>;
}

impl<T: BusWriter + ?Sized> BusWriter for &mut T {
    type Error = T::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        (**self).write_byte(byte)
    }
}
