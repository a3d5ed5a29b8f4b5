//! Power up of a [`Lcd`]
//!
//! [`Builder::new`] wires a session to its [`Dispatcher`], [`Builder::init`]
//! sends the HD44780 4 bit handshake and is the only way to a [`Lcd`].

use core::sync::atomic::AtomicBool;

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};
use embedded_hal_async::delay::DelayNs;

use crate::{
    command::State,
    dispatcher::{self, Dispatcher, Request, RequestChannel, RequestSender},
    lcd::Lcd,
    pins::PinMap,
    protocol::Encoder,
    sender::BusWriter,
};

/// [`Config`] is the init config of a [`Lcd`]
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    backlight: State,
}

#[allow(missing_docs)]
impl Config {
    pub fn get_backlight(&self) -> State {
        self.backlight
    }

    pub fn set_backlight(mut self, backlight: State) -> Self {
        self.backlight = backlight;
        self
    }
}

/// Holds everything a [`Lcd`] needs until the power up handshake is sent
///
/// The only way to get a [`Lcd`] is [`Builder::init`], so a session is never
/// used on an uninitialized controller.
pub struct Builder<'ch, M: RawMutex> {
    sender: RequestSender<'ch, M>,
    encoder: Encoder,
    config: Config,
}

impl<'ch, M: RawMutex> Builder<'ch, M> {
    /// Split a [`RequestChannel`] into a [`Builder`] and the [`Dispatcher`]
    /// that owns the bus
    ///
    /// The dispatcher has to be running before [`Builder::init`] is awaited,
    /// otherwise the handshake never leaves the channel.
    pub fn new<Bus, Delay>(
        channel: &'ch mut RequestChannel<'_, M>,
        pins: PinMap,
        bus: Bus,
        delay: Delay,
        config: Config,
    ) -> (Self, Dispatcher<'ch, M, Bus, Delay>)
    where
        Bus: BusWriter,
        Delay: DelayNs,
    {
        let (sender, receiver) = channel.split();
        let builder = Self {
            sender,
            encoder: Encoder::new(pins),
            config,
        };
        let dispatcher = Dispatcher::new(receiver, bus, delay, pins);

        (builder, dispatcher)
    }

    /// Send the power up handshake and hand out the session
    ///
    /// Returns once every write of the handshake has been executed by the
    /// dispatcher.
    pub async fn init(self) -> Lcd<'ch, M> {
        let backlight = self.config.get_backlight();
        let mut sender = self.sender;

        for transfer in self.encoder.init_sequence(backlight) {
            dispatcher::submit(&mut sender, Request::Transfer(transfer)).await;
        }

        #[cfg(feature = "defmt")]
        defmt::info!("LCD1602 initialized, backlight {}", backlight);

        Lcd {
            sender: Mutex::new(sender),
            encoder: self.encoder,
            backlight: AtomicBool::new(backlight == State::On),
            closed: AtomicBool::new(false),
        }
    }
}
