use embedded_hal::i2c::I2c;

use crate::{error::Error, sender::BusWriter};

// I2C to parallel, default wiring:
// P7 -> P0
// DB7/DB6/DB5/DB4/BL/E/RW/RS
// other wirings are described by a PinMap, this sender only moves bytes

/// [`BusWriter`] over an [`embedded_hal::i2c::I2c`] bus, one single byte
/// write transaction per call
pub struct I2cSender<I2cLcd: I2c> {
    i2c: I2cLcd,
    addr: u8,
}

impl<I2cLcd: I2c> I2cSender<I2cLcd> {
    /// Bind the bus to a 7 bit device address
    ///
    /// Addresses in the reserved ranges (0x00..=0x07 and 0x78..=0x7F) are
    /// rejected.
    pub fn new(i2c: I2cLcd, addr: u8) -> Result<Self, Error> {
        if !(0x08..=0x77).contains(&addr) {
            return Err(Error::InvalidAddress(addr));
        }

        Ok(Self { i2c, addr })
    }

    #[allow(missing_docs)]
    pub fn address(&self) -> u8 {
        self.addr
    }

    /// Give the bus back
    pub fn release(self) -> I2cLcd {
        self.i2c
    }
}

impl<I2cLcd: I2c> BusWriter for I2cSender<I2cLcd> {
    type Error = I2cLcd::Error;

    fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
        self.i2c.write(self.addr, &[byte])
    }
}
