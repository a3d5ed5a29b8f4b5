//! The display session
//!
//! A [`Lcd`] is the producer side of a [`RequestChannel`](crate::dispatcher::RequestChannel):
//! every operation encodes its writes and hands them to the
//! [`Dispatcher`](crate::dispatcher::Dispatcher) one at a time, each
//! submission returning once the write is on the bus. It takes `&self`, so
//! one session can be shared by several tasks (put it in a `static` with a
//! `CriticalSectionRawMutex` channel).
//!
//! An operation holds the sending side for all of its writes, two tasks
//! printing different rows never mix their cursor moves.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::{blocking_mutex::raw::RawMutex, mutex::Mutex};

use crate::{
    command::{CommandSet, RegisterSelection, State},
    dispatcher::{self, Request, RequestSender},
    error::Error,
    pins::PinMap,
    protocol::{Encoder, Row, Transfer},
};

pub mod init;

pub use init::{Builder, Config};

/// A running LCD1602 session, obtained from [`Builder::init`]
pub struct Lcd<'ch, M: RawMutex> {
    sender: Mutex<M, RequestSender<'ch, M>>,
    encoder: Encoder,
    backlight: AtomicBool,
    closed: AtomicBool,
}

impl<'ch, M: RawMutex> Lcd<'ch, M> {
    /// Print `text` on `row`, padded with spaces to the field width
    ///
    /// Text longer than the field is cut, characters outside ASCII show as a
    /// full block.
    pub async fn print_row(&self, row: Row, text: &str) -> Result<(), Error> {
        let backlight = self.backlight();
        self.submit_all(self.encoder.row(row, text, backlight)).await
    }

    #[allow(missing_docs)]
    pub async fn print_row1(&self, text: &str) -> Result<(), Error> {
        self.print_row(Row::First, text).await
    }

    #[allow(missing_docs)]
    pub async fn print_row2(&self, text: &str) -> Result<(), Error> {
        self.print_row(Row::Second, text).await
    }

    /// Print a padded field wherever the cursor currently is
    pub async fn print_text(&self, text: &str) -> Result<(), Error> {
        let backlight = self.backlight();
        self.submit_all(self.encoder.text(text, backlight)).await
    }

    /// Send a raw instruction byte
    pub async fn send_command(&self, value: u8) -> Result<(), Error> {
        let transfer = self
            .encoder
            .byte(RegisterSelection::Command, self.backlight(), value);
        self.submit_all(core::iter::once(transfer)).await
    }

    /// Send a raw data byte to the current DDRAM or CGRAM address
    pub async fn send_data(&self, value: u8) -> Result<(), Error> {
        let transfer = self.encoder.data(value, self.backlight());
        self.submit_all(core::iter::once(transfer)).await
    }

    /// Send a typed instruction
    pub async fn send(&self, command: CommandSet) -> Result<(), Error> {
        let transfer = self.encoder.command(command, self.backlight());
        self.submit_all(core::iter::once(transfer)).await
    }

    #[allow(missing_docs)]
    pub async fn clear(&self) -> Result<(), Error> {
        self.send(CommandSet::ClearDisplay).await
    }

    #[allow(missing_docs)]
    pub async fn return_home(&self) -> Result<(), Error> {
        self.send(CommandSet::ReturnHome).await
    }

    /// Define custom character `index` (0..=7), one byte per pixel line, only
    /// the lower 5 bits of each line are used
    ///
    /// The cursor is moved back to the start of the first row afterwards, so
    /// following data lands in DDRAM again.
    pub async fn write_graph_to_cgram(&self, index: u8, graph: &[u8; 8]) -> Result<(), Error> {
        if index >= 8 {
            return Err(Error::GraphIndexOutOfRange(index));
        }

        let backlight = self.backlight();
        let encoder = self.encoder;

        let address = encoder.command(CommandSet::SetCGRAM(index << 3), backlight);
        let lines = graph
            .iter()
            .map(move |&line| encoder.data(line & 0b0001_1111, backlight));
        let restore = encoder.command(Row::First.command(), backlight);

        let transfers = core::iter::once(address)
            .chain(lines)
            .chain(core::iter::once(restore));

        self.submit_all(transfers).await
    }

    /// Switch the backlight, the new level is driven on the bus right away
    /// and kept by every following write
    pub async fn set_backlight(&self, backlight: State) -> Result<(), Error> {
        self.ensure_open()?;
        self.backlight.store(backlight == State::On, Ordering::Relaxed);
        self.submit_all(core::iter::once(self.encoder.level(backlight))).await
    }

    #[allow(missing_docs)]
    pub fn backlight(&self) -> State {
        match self.backlight.load(Ordering::Relaxed) {
            true => State::On,
            false => State::Off,
        }
    }

    #[allow(missing_docs)]
    pub fn pins(&self) -> &PinMap {
        self.encoder.pins()
    }

    /// Stop the dispatcher once everything submitted so far is on the bus
    ///
    /// Returns after the dispatcher has taken the close. Operations waiting
    /// for the session at that point, and every later one, fail with
    /// [`Error::Closed`].
    pub async fn close(&self) -> Result<(), Error> {
        let mut sender = self.sender.lock().await;
        self.ensure_open()?;
        self.closed.store(true, Ordering::Release);
        dispatcher::submit(&mut *sender, Request::Close).await;

        #[cfg(feature = "defmt")]
        defmt::info!("LCD1602 session closed");

        Ok(())
    }

    #[allow(missing_docs)]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.is_closed() {
            #[cfg(feature = "defmt")]
            defmt::warn!("LCD1602 write rejected, session closed");

            return Err(Error::Closed);
        }
        Ok(())
    }

    async fn submit_all(&self, transfers: impl Iterator<Item = Transfer>) -> Result<(), Error> {
        let mut sender = self.sender.lock().await;
        self.ensure_open()?;

        for transfer in transfers {
            dispatcher::submit(&mut *sender, Request::Transfer(transfer)).await;
        }

        Ok(())
    }
}
