//! The single consumer in front of the bus
//!
//! Every expander write of a session goes through one [`RequestChannel`].
//! The channel has a single slot and that slot is also the execution slot:
//! the [`Dispatcher`] frees it only once a request is on the bus and its
//! hold has elapsed. A producer submitting a request waits for exactly that,
//! so nothing is ever buffered beyond the request being executed and the
//! [`BusWriter`] is only ever touched by the dispatcher.
//!
//! [`Dispatcher::run`] is a regular `async fn`, **not** an Embassy `#[task]`.
//! Tasks cannot be generic, so firmware wraps it in a thin concrete task:
//!
//! ```ignore
//! #[embassy_executor::task]
//! async fn lcd_dispatcher(
//!     dispatcher: Dispatcher<'static, CriticalSectionRawMutex, I2cSender<MyI2c>, Delay>,
//! ) {
//!     dispatcher.run().await;
//! }
//! ```

use embassy_sync::{blocking_mutex::raw::RawMutex, zerocopy_channel};
use embedded_hal_async::delay::DelayNs;

use crate::{
    command::State,
    pins::PinMap,
    protocol::{TimedWrite, Transfer},
    sender::BusWriter,
};

#[cfg(feature = "defmt")]
use crate::utils::BitPattern;

/// What producers hand to the dispatcher
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Put a transfer on the bus
    Transfer(Transfer),
    /// Stop after everything submitted before this request
    Close,
}

/// Backing storage of a [`RequestChannel`], `[Request::Close]` is a fine
/// initial value
pub type RequestSlot = [Request; 1];

pub(crate) type RequestSender<'ch, M> = zerocopy_channel::Sender<'ch, M, Request>;
pub(crate) type RequestReceiver<'ch, M> = zerocopy_channel::Receiver<'ch, M, Request>;

/// The hand-off shared by a session and its dispatcher
pub struct RequestChannel<'slot, M: RawMutex> {
    inner: zerocopy_channel::Channel<'slot, M, Request>,
}

impl<'slot, M: RawMutex> RequestChannel<'slot, M> {
    #[allow(missing_docs)]
    pub fn new(slot: &'slot mut RequestSlot) -> Self {
        Self {
            inner: zerocopy_channel::Channel::new(slot),
        }
    }

    pub(crate) fn split(&mut self) -> (RequestSender<'_, M>, RequestReceiver<'_, M>) {
        self.inner.split()
    }
}

/// Put `request` in the slot and wait until the dispatcher is done with it
pub(crate) async fn submit<M: RawMutex>(sender: &mut RequestSender<'_, M>, request: Request) {
    *sender.send().await = request;
    sender.send_done();

    // the slot frees once the request has been executed
    let _ = sender.send().await;
}

/// Counters returned by [`Dispatcher::run`] when it exits
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchReport {
    /// Enable pulses executed
    pub pulses: u32,
    /// Enable-free level writes executed
    pub levels: u32,
    /// Bus writes that returned an error
    pub failed_writes: u32,
}

/// Executes [`Request`]s strictly in submission order
pub struct Dispatcher<'ch, M, Bus, Delay>
where
    M: RawMutex,
    Bus: BusWriter,
    Delay: DelayNs,
{
    receiver: RequestReceiver<'ch, M>,
    bus: Bus,
    delay: Delay,
    pins: PinMap,
    report: DispatchReport,
}

impl<'ch, M, Bus, Delay> Dispatcher<'ch, M, Bus, Delay>
where
    M: RawMutex,
    Bus: BusWriter,
    Delay: DelayNs,
{
    pub(crate) fn new(
        receiver: RequestReceiver<'ch, M>,
        bus: Bus,
        delay: Delay,
        pins: PinMap,
    ) -> Self {
        Self {
            receiver,
            bus,
            delay,
            pins,
            report: DispatchReport::default(),
        }
    }

    /// Consume requests until [`Request::Close`]
    ///
    /// Everything submitted before the close is executed first. A stalled
    /// bus stalls this loop, there is no timeout.
    pub async fn run(mut self) -> DispatchReport {
        #[cfg(feature = "defmt")]
        defmt::debug!("LCD dispatcher started");

        loop {
            let request = *self.receiver.receive().await;

            if let Request::Transfer(transfer) = request {
                self.execute(transfer).await;
            }
            self.receiver.receive_done();

            if request == Request::Close {
                break;
            }
        }

        #[cfg(feature = "defmt")]
        defmt::info!("LCD dispatcher stopped: {}", self.report);

        self.report
    }

    async fn execute(&mut self, transfer: Transfer) {
        if let Transfer::Level(byte) = transfer {
            let idle = self.pins.with_enable(byte, State::Off);
            self.write(idle);
            self.report.levels = self.report.levels.wrapping_add(1);
            return;
        }

        for &write in transfer.writes() {
            self.pulse(write).await;
        }
    }

    // E high latches on the falling edge, so the same payload goes out twice
    async fn pulse(&mut self, write: TimedWrite) {
        let rising = self.pins.with_enable(write.payload(), State::On);
        let falling = self.pins.with_enable(write.payload(), State::Off);

        self.write(rising);
        self.write(falling);
        self.report.pulses = self.report.pulses.wrapping_add(1);

        self.delay.delay_us(write.hold_us()).await;
    }

    fn write(&mut self, byte: u8) {
        if self.bus.write_byte(byte).is_err() {
            self.report.failed_writes = self.report.failed_writes.wrapping_add(1);

            #[cfg(feature = "defmt")]
            defmt::warn!("LCD bus write {} failed, dropped", BitPattern(byte));
        }
    }
}

#[cfg(test)]
mod tests {
    use core::cell::RefCell;
    use std::vec::Vec;

    use embassy_futures::{block_on, join::join, poll_once};
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;

    use super::*;
    use crate::{command::Bits, protocol::Encoder};

    struct RecordingBus<'a>(&'a RefCell<Vec<u8>>);

    impl BusWriter for RecordingBus<'_> {
        type Error = ();

        fn write_byte(&mut self, byte: u8) -> Result<(), Self::Error> {
            self.0.borrow_mut().push(byte);
            Ok(())
        }
    }

    struct BrokenBus;

    impl BusWriter for BrokenBus {
        type Error = ();

        fn write_byte(&mut self, _byte: u8) -> Result<(), Self::Error> {
            Err(())
        }
    }

    struct RecordingDelay<'a>(&'a RefCell<Vec<u32>>);

    impl DelayNs for RecordingDelay<'_> {
        async fn delay_ns(&mut self, ns: u32) {
            self.0.borrow_mut().push(ns / 1_000);
        }

        async fn delay_us(&mut self, us: u32) {
            self.0.borrow_mut().push(us);
        }
    }

    #[test]
    fn pulse_is_enable_high_then_low_then_hold() {
        let mut slot: RequestSlot = [Request::Close];
        let mut channel = RequestChannel::<NoopRawMutex>::new(&mut slot);
        let (mut sender, receiver) = channel.split();
        let bus_log = RefCell::new(Vec::new());
        let holds = RefCell::new(Vec::new());
        let pins = PinMap::pcf8574();

        let dispatcher = Dispatcher::new(
            receiver,
            RecordingBus(&bus_log),
            RecordingDelay(&holds),
            pins,
        );

        let encoder = Encoder::new(pins);
        let producer = async {
            submit(&mut sender, Request::Transfer(encoder.data(b'H', State::On))).await;
            submit(&mut sender, Request::Close).await;
        };

        let (report, ()) = block_on(join(dispatcher.run(), producer));

        // 'H' = 0x48, RS and backlight set, E is bit 2
        assert_eq!(
            *bus_log.borrow(),
            [0b0100_1101, 0b0100_1001, 0b1000_1101, 0b1000_1001]
        );
        assert_eq!(*holds.borrow(), [1_000, 1_000]);
        assert_eq!(
            report,
            DispatchReport {
                pulses: 2,
                levels: 0,
                failed_writes: 0,
            }
        );
    }

    #[test]
    fn submit_waits_for_a_consumer() {
        let mut slot: RequestSlot = [Request::Close];
        let mut channel = RequestChannel::<NoopRawMutex>::new(&mut slot);
        let (mut sender, mut receiver) = channel.split();
        let encoder = Encoder::new(PinMap::pcf8574());
        let request = Request::Transfer(encoder.data(b'X', State::On));

        // nobody is consuming, the submission cannot complete
        assert!(poll_once(submit(&mut sender, request)).is_pending());
        assert!(sender.is_full());
        assert_eq!(receiver.try_receive().copied(), Some(request));
    }

    #[test]
    fn submit_returns_once_the_request_is_on_the_bus() {
        let mut slot: RequestSlot = [Request::Close];
        let mut channel = RequestChannel::<NoopRawMutex>::new(&mut slot);
        let (mut sender, receiver) = channel.split();
        let bus_log = RefCell::new(Vec::new());
        let holds = RefCell::new(Vec::new());
        let pins = PinMap::pcf8574();
        let encoder = Encoder::new(pins);

        let dispatcher = Dispatcher::new(
            receiver,
            RecordingBus(&bus_log),
            RecordingDelay(&holds),
            pins,
        );

        let producer = async {
            for (index, value) in (b'a'..=b'c').enumerate() {
                submit(&mut sender, Request::Transfer(encoder.data(value, State::On))).await;
                assert_eq!(bus_log.borrow().len(), 4 * (index + 1));
                assert_eq!(holds.borrow().len(), 2 * (index + 1));
                assert!(sender.is_empty());
            }
            submit(&mut sender, Request::Close).await;
        };

        let (report, ()) = block_on(join(dispatcher.run(), producer));
        assert_eq!(report.pulses, 6);
    }

    #[test]
    fn level_write_never_raises_enable() {
        let mut slot: RequestSlot = [Request::Close];
        let mut channel = RequestChannel::<NoopRawMutex>::new(&mut slot);
        let (mut sender, receiver) = channel.split();
        let bus_log = RefCell::new(Vec::new());
        let holds = RefCell::new(Vec::new());
        let pins = PinMap::pcf8574();

        let dispatcher = Dispatcher::new(
            receiver,
            RecordingBus(&bus_log),
            RecordingDelay(&holds),
            pins,
        );

        let producer = async {
            submit(&mut sender, Request::Transfer(Transfer::Level(0b0000_1100))).await;
            submit(&mut sender, Request::Close).await;
        };

        let (report, ()) = block_on(join(dispatcher.run(), producer));

        assert_eq!(*bus_log.borrow(), [0b0000_1000]);
        assert!(holds.borrow().is_empty());
        assert_eq!(report.levels, 1);
        assert_eq!(report.pulses, 0);
    }

    #[test]
    fn close_drains_earlier_requests_and_exits() {
        let mut slot: RequestSlot = [Request::Close];
        let mut channel = RequestChannel::<NoopRawMutex>::new(&mut slot);
        let (mut sender, receiver) = channel.split();
        let bus_log = RefCell::new(Vec::new());
        let holds = RefCell::new(Vec::new());
        let pins = PinMap::pcf8574();
        let encoder = Encoder::new(pins);

        let dispatcher = Dispatcher::new(
            receiver,
            RecordingBus(&bus_log),
            RecordingDelay(&holds),
            pins,
        );

        let producer = async {
            for value in 0..10u8 {
                submit(&mut sender, Request::Transfer(encoder.data(value, State::On))).await;
            }
            submit(&mut sender, Request::Close).await;
        };

        let (report, ()) = block_on(join(dispatcher.run(), producer));

        assert_eq!(report.pulses, 20);
        assert_eq!(bus_log.borrow().len(), 40);
        assert_eq!(holds.borrow().len(), 20);
        // the close itself was released too
        assert!(sender.is_empty());
    }

    #[test]
    fn bus_failures_are_counted_not_propagated() {
        let mut slot: RequestSlot = [Request::Close];
        let mut channel = RequestChannel::<NoopRawMutex>::new(&mut slot);
        let (mut sender, receiver) = channel.split();
        let holds = RefCell::new(Vec::new());
        let pins = PinMap::pcf8574();
        let encoder = Encoder::new(pins);

        let dispatcher = Dispatcher::new(receiver, BrokenBus, RecordingDelay(&holds), pins);

        let producer = async {
            let clear = encoder.command(Bits::Bit8(0x01), State::On);
            submit(&mut sender, Request::Transfer(clear)).await;
            submit(&mut sender, Request::Close).await;
        };

        let (report, ()) = block_on(join(dispatcher.run(), producer));

        assert_eq!(report.pulses, 2);
        assert_eq!(report.failed_writes, 4);
        // timing is still honoured on a broken bus
        assert_eq!(*holds.borrow(), [1_000, 1_000]);
    }
}
