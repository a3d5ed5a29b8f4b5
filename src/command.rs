//! LCD1602 instruction set
//!
//! [`CommandSet`] names the HD44780 instructions this driver issues, and
//! converts into the raw [`Bits`] that go on DB4..DB7.

use crate::utils::BitOps;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum CommandSet {
    ClearDisplay,
    ReturnHome,
    EntryModeSet(MoveDirection, ShiftType),
    DisplayOnOff {
        display: State,
        cursor: State,
        cursor_blink: State,
    },
    CursorOrDisplayShift(ShiftType, MoveDirection),
    // this is not a command from datasheet,
    // it's the first (half) command of 4 pin mode
    // we name it, to make things tidy
    HalfFunctionSet,
    FunctionSet(DataWidth, LineMode, Font),
    SetCGRAM(u8),
    SetDDRAM(u8),
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum MoveDirection {
    RightToLeft,
    #[default]
    LeftToRight,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum ShiftType {
    #[default]
    CursorOnly,
    CursorAndDisplay,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum State {
    Off,
    #[default]
    On,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum DataWidth {
    #[default]
    Bit4,
    Bit8,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum LineMode {
    OneLine,
    #[default]
    TwoLine,
}

#[derive(Clone, Copy, PartialEq, Eq, Default, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[allow(missing_docs)]
pub enum Font {
    #[default]
    Font5x8,
    Font5x11,
}

/// Which LCD register a write lands in, driven by the RS line
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegisterSelection {
    /// Instruction register
    Command,
    /// Data register (DDRAM or CGRAM, depending on the last address set)
    Data,
}

/// Raw instruction payload
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Bits {
    /// A single nibble, only used while switching into 4 bit mode
    Bit4(u8),
    /// A full byte, sent as two nibbles
    Bit8(u8),
}

impl From<CommandSet> for Bits {
    fn from(command: CommandSet) -> Self {
        match command {
            CommandSet::ClearDisplay => Bits::Bit8(0b0000_0001),

            CommandSet::ReturnHome => Bits::Bit8(0b0000_0010),

            CommandSet::EntryModeSet(dir, st) => {
                let mut raw_bits: u8 = 0b0000_0100;

                raw_bits = match dir {
                    MoveDirection::RightToLeft => raw_bits.clear_bit(1),
                    MoveDirection::LeftToRight => raw_bits.set_bit(1),
                };

                raw_bits = match st {
                    ShiftType::CursorOnly => raw_bits.clear_bit(0),
                    ShiftType::CursorAndDisplay => raw_bits.set_bit(0),
                };

                Bits::Bit8(raw_bits)
            }

            CommandSet::DisplayOnOff {
                display,
                cursor,
                cursor_blink,
            } => {
                let raw_bits = 0b0000_1000u8
                    .put_bit(2, (display == State::On).into())
                    .put_bit(1, (cursor == State::On).into())
                    .put_bit(0, (cursor_blink == State::On).into());

                Bits::Bit8(raw_bits)
            }

            CommandSet::CursorOrDisplayShift(st, dir) => {
                let mut raw_bits = 0b0001_0000u8;

                raw_bits = match st {
                    ShiftType::CursorOnly => raw_bits.clear_bit(3),
                    ShiftType::CursorAndDisplay => raw_bits.set_bit(3),
                };

                raw_bits = match dir {
                    MoveDirection::RightToLeft => raw_bits.clear_bit(2),
                    MoveDirection::LeftToRight => raw_bits.set_bit(2),
                };

                Bits::Bit8(raw_bits)
            }

            CommandSet::HalfFunctionSet => Bits::Bit4(0b0010),

            CommandSet::FunctionSet(width, line, font) => {
                let raw_bits = 0b0010_0000u8
                    .put_bit(4, (width == DataWidth::Bit8).into())
                    .put_bit(3, (line == LineMode::TwoLine).into())
                    .put_bit(2, (font == Font::Font5x11).into());

                Bits::Bit8(raw_bits)
            }

            // address is truncated to the field width, like the controller does
            CommandSet::SetCGRAM(addr) => Bits::Bit8(0b0100_0000 | (addr & 0b0011_1111)),

            CommandSet::SetDDRAM(addr) => Bits::Bit8(0b1000_0000 | (addr & 0b0111_1111)),
        }
    }
}
