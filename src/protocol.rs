//! HD44780 4 bit protocol
//!
//! Turns logical operations into [`Transfer`]s: ordered, timed expander
//! writes that the [`Dispatcher`](crate::dispatcher::Dispatcher) pulses onto
//! the bus. Nothing here touches hardware, every function is a pure
//! generator.
//!
//! In 4 bit mode every byte goes out as two nibbles, high nibble first. The
//! RS line is set on both nibbles of a data byte and clear on both nibbles of
//! a command byte, the backlight line carries the current backlight state.

use core::iter;

use crate::{
    command::{Bits, CommandSet, DataWidth, Font, LineMode, RegisterSelection, State},
    pins::{Lines, PinMap},
};

/// Hold after every steady state nibble, in microseconds
pub const DEFAULT_HOLD_US: u32 = 1_000;

/// Hold after each mode switch nibble, in microseconds
///
/// Covers both the >= 4.1 ms and the >= 100 us settle windows of the power
/// up sequence.
pub const MODE_SWITCH_HOLD_US: u32 = 5_000;

/// How many times the mode switch nibble is pulsed
pub const MODE_SWITCH_PULSES: usize = 2;

/// Cells written by every row print, text is padded or cut to this width
pub const ROW_FIELD_WIDTH: usize = 17;

/// Glyph sent for characters outside ASCII, a full block in the HD44780 ROM
pub const FALLBACK_GLYPH: u8 = 0xFF;

/// Commands issued right after the mode switch, in this exact order
pub const INIT_COMMANDS: [CommandSet; 4] = [
    CommandSet::FunctionSet(DataWidth::Bit4, LineMode::TwoLine, Font::Font5x8),
    CommandSet::DisplayOnOff {
        display: State::On,
        cursor: State::Off,
        cursor_blink: State::Off,
    },
    CommandSet::ClearDisplay,
    CommandSet::ReturnHome,
];

/// One enable pulse: the expander byte to latch, and how long the bus must
/// stay idle after the falling edge
///
/// The enable bit of `payload` is always clear, the dispatcher drives it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedWrite {
    payload: u8,
    hold_us: u32,
}

impl TimedWrite {
    #[allow(missing_docs)]
    pub const fn new(payload: u8, hold_us: u32) -> Self {
        Self { payload, hold_us }
    }

    #[allow(missing_docs)]
    pub const fn payload(&self) -> u8 {
        self.payload
    }

    /// Hold after the falling edge, in microseconds
    pub const fn hold_us(&self) -> u32 {
        self.hold_us
    }
}

/// The unit the dispatcher executes without interleaving
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transfer {
    /// Drive a line level without pulsing enable, nothing is latched
    Level(u8),
    /// A lone nibble (mode switch only)
    Nibble(TimedWrite),
    /// Both nibbles of one byte, high nibble first
    Byte([TimedWrite; 2]),
}

impl Transfer {
    /// The enable pulses of this transfer, in bus order
    pub fn writes(&self) -> &[TimedWrite] {
        match self {
            Transfer::Level(_) => &[],
            Transfer::Nibble(write) => core::slice::from_ref(write),
            Transfer::Byte(writes) => writes,
        }
    }
}

/// One of the two display rows
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Row {
    /// Upper row, DDRAM 0x00
    First,
    /// Lower row, DDRAM 0x28
    Second,
}

impl Row {
    /// DDRAM address of the row's first cell
    ///
    /// The controller keeps 40 bytes per line, so the second line starts at 40
    /// whatever the visible width is.
    pub const fn ddram_address(self) -> u8 {
        match self {
            Row::First => 0x00,
            Row::Second => 0x28,
        }
    }

    /// The set DDRAM address command that moves the cursor to this row
    pub const fn command(self) -> CommandSet {
        CommandSet::SetDDRAM(self.ddram_address())
    }
}

/// Map a character to its character ROM code
pub fn rom_code(c: char) -> u8 {
    if c.is_ascii() {
        c as u8
    } else {
        FALLBACK_GLYPH
    }
}

/// The cells of one printed field: `text` mapped to ROM codes, padded with
/// spaces and cut to [`ROW_FIELD_WIDTH`]
pub fn row_cells(text: &str) -> impl Iterator<Item = u8> + '_ {
    text.chars()
        .map(rom_code)
        .chain(iter::repeat(b' '))
        .take(ROW_FIELD_WIDTH)
}

/// Encodes logical operations for one pin wiring
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Encoder {
    pins: PinMap,
}

impl Encoder {
    #[allow(missing_docs)]
    pub const fn new(pins: PinMap) -> Self {
        Self { pins }
    }

    #[allow(missing_docs)]
    pub fn pins(&self) -> &PinMap {
        &self.pins
    }

    /// A single nibble pulse
    pub fn nibble(
        &self,
        register_selection: RegisterSelection,
        backlight: State,
        nibble: u8,
        hold_us: u32,
    ) -> TimedWrite {
        let lines = Lines::new(register_selection, backlight, nibble);
        TimedWrite::new(self.pins.compose(lines), hold_us)
    }

    /// A full byte as two nibbles, high nibble first
    pub fn byte(
        &self,
        register_selection: RegisterSelection,
        backlight: State,
        value: u8,
    ) -> Transfer {
        Transfer::Byte([
            self.nibble(register_selection, backlight, value >> 4, DEFAULT_HOLD_US),
            self.nibble(register_selection, backlight, value & 0x0F, DEFAULT_HOLD_US),
        ])
    }

    /// An instruction, with RS clear
    pub fn command(&self, command: impl Into<Bits>, backlight: State) -> Transfer {
        match command.into() {
            Bits::Bit4(nibble) => Transfer::Nibble(self.nibble(
                RegisterSelection::Command,
                backlight,
                nibble,
                MODE_SWITCH_HOLD_US,
            )),
            Bits::Bit8(value) => self.byte(RegisterSelection::Command, backlight, value),
        }
    }

    /// A data byte, with RS set
    pub fn data(&self, value: u8, backlight: State) -> Transfer {
        self.byte(RegisterSelection::Data, backlight, value)
    }

    /// Idle levels with the given backlight, latches nothing
    pub fn level(&self, backlight: State) -> Transfer {
        let lines = Lines::new(RegisterSelection::Command, backlight, 0);
        Transfer::Level(self.pins.compose(lines))
    }

    /// A padded field at the current cursor position
    pub fn text<'a>(&self, text: &'a str, backlight: State) -> impl Iterator<Item = Transfer> + 'a {
        let encoder = *self;
        row_cells(text).map(move |cell| encoder.data(cell, backlight))
    }

    /// Address `row`, then write `text` as a padded field
    pub fn row<'a>(
        &self,
        row: Row,
        text: &'a str,
        backlight: State,
    ) -> impl Iterator<Item = Transfer> + 'a {
        iter::once(self.command(row.command(), backlight)).chain(self.text(text, backlight))
    }

    /// The power up handshake: mode switch nibbles, [`INIT_COMMANDS`], then a
    /// blank print of both rows
    pub fn init_sequence(&self, backlight: State) -> impl Iterator<Item = Transfer> {
        let encoder = *self;

        iter::repeat(CommandSet::HalfFunctionSet)
            .take(MODE_SWITCH_PULSES)
            .chain(INIT_COMMANDS)
            .map(move |command| encoder.command(command, backlight))
            .chain(self.row(Row::First, "", backlight))
            .chain(self.row(Row::Second, "", backlight))
    }
}
