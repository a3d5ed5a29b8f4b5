/*!
# LCD 1602 Bus Driver

Async driver for an HD44780 compatible 16x2 LCD wired through an 8 bit I/O
expander (PCF8574 style I2C backpack) in 4-bit mode.

Every expander write goes through one queue and one consumer, so tasks
sharing a display never interleave half commands on the bus.

Basic Usage:

1. Create a [`dispatcher::RequestChannel`] over a [`dispatcher::RequestSlot`],
   and a "sender" <br/>
    The built-in sender is [`sender::I2cSender`], any transport implementing
    [`sender::BusWriter`] works as well.
<br/>
<br/>
2. Use [`lcd::Builder::new()`] with a [`pins::PinMap`] describing the
   backpack wiring, it hands back a [`lcd::Builder`] and a
   [`dispatcher::Dispatcher`]
<br/>
<br/>
3. Spawn [`dispatcher::Dispatcher::run()`], then await [`lcd::Builder::init()`]
   to get a [`lcd::Lcd`]
<br/>
<br/>
4. use any methods provide by [`lcd::Lcd`] to control LCD1602, and
   [`lcd::Lcd::close()`] to stop the dispatcher
*/

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

pub mod command;
pub mod dispatcher;
pub mod error;
pub mod lcd;
pub mod pins;
pub mod protocol;
pub mod sender;
pub mod utils;

pub use error::Error;
