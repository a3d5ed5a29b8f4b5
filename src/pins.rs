//! Wiring between the I2C expander byte and the LCD1602 signal lines
//!
//! An I2C backpack drives the LCD through an 8 bit port expander, every bit of
//! the transmitted byte is one signal line. [`PinMap`] records which bit is
//! which line, and [`Lines`] is the logical level of every line for one write.

use crate::{
    command::{RegisterSelection, State},
    error::Error,
    utils::{BitOps, BitState},
};

/// A signal line of the LCD1602 4 bit interface
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PinLine {
    #[allow(missing_docs)]
    RegisterSelect,
    #[allow(missing_docs)]
    ReadWrite,
    #[allow(missing_docs)]
    Enable,
    #[allow(missing_docs)]
    Db4,
    #[allow(missing_docs)]
    Db5,
    #[allow(missing_docs)]
    Db6,
    #[allow(missing_docs)]
    Db7,
    #[allow(missing_docs)]
    Backlight,
}

impl PinLine {
    /// Every line, in wiring order
    pub const ALL: [PinLine; 8] = [
        PinLine::RegisterSelect,
        PinLine::ReadWrite,
        PinLine::Enable,
        PinLine::Db4,
        PinLine::Db5,
        PinLine::Db6,
        PinLine::Db7,
        PinLine::Backlight,
    ];
}

/// Bit position of each signal line inside the expander byte
///
/// Always valid once constructed: every position is in 0..=7 and no two
/// lines share a bit.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PinMap {
    rs: u8,
    rw: u8,
    en: u8,
    db: [u8; 4],
    backlight: u8,
}

impl Default for PinMap {
    fn default() -> Self {
        Self::pcf8574()
    }
}

impl PinMap {
    /// Create a [`PinMap`] from bit positions, rejecting positions outside
    /// the byte and lines sharing a bit
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rs: u8,
        rw: u8,
        en: u8,
        db4: u8,
        db5: u8,
        db6: u8,
        db7: u8,
        backlight: u8,
    ) -> Result<Self, Error> {
        let pins = Self {
            rs,
            rw,
            en,
            db: [db4, db5, db6, db7],
            backlight,
        };
        pins.validate()?;
        Ok(pins)
    }

    /// The wiring of the common PCF8574 backpack
    ///
    /// P7 -> P0
    /// DB7/DB6/DB5/DB4/BL/E/RW/RS
    pub const fn pcf8574() -> Self {
        Self {
            rs: 0,
            rw: 1,
            en: 2,
            db: [4, 5, 6, 7],
            backlight: 3,
        }
    }

    /// Bit position of `line`
    pub fn position(&self, line: PinLine) -> u8 {
        match line {
            PinLine::RegisterSelect => self.rs,
            PinLine::ReadWrite => self.rw,
            PinLine::Enable => self.en,
            PinLine::Db4 => self.db[0],
            PinLine::Db5 => self.db[1],
            PinLine::Db6 => self.db[2],
            PinLine::Db7 => self.db[3],
            PinLine::Backlight => self.backlight,
        }
    }

    fn validate(&self) -> Result<(), Error> {
        let mut owner: [Option<PinLine>; 8] = [None; 8];

        for line in PinLine::ALL {
            let position = self.position(line);
            if position > 7 {
                return Err(Error::PinOutOfRange { line, position });
            }
            if let Some(other) = owner[position as usize] {
                return Err(Error::PinOverlap {
                    line,
                    other,
                    position,
                });
            }
            owner[position as usize] = Some(line);
        }

        Ok(())
    }

    /// Compose the expander byte for the given line levels
    ///
    /// RW is always driven low, this driver never reads back from the LCD.
    pub fn compose(&self, lines: Lines) -> u8 {
        let mut byte = 0u8
            .put_bit(
                self.rs,
                (lines.register_selection == RegisterSelection::Data).into(),
            )
            .clear_bit(self.rw)
            .put_bit(self.en, (lines.enable == State::On).into())
            .put_bit(self.backlight, (lines.backlight == State::On).into());

        for (index, &pin) in self.db.iter().enumerate() {
            byte = byte.put_bit(pin, lines.nibble.check_bit(index as u8));
        }

        byte
    }

    /// Read the line levels back out of an expander byte
    pub fn decompose(&self, byte: u8) -> Lines {
        let nibble = self
            .db
            .iter()
            .enumerate()
            .fold(0u8, |acc, (index, &pin)| {
                acc.put_bit(index as u8, byte.check_bit(pin))
            });

        Lines {
            register_selection: match byte.check_bit(self.rs) {
                BitState::Set => RegisterSelection::Data,
                BitState::Clear => RegisterSelection::Command,
            },
            backlight: state_of(byte.check_bit(self.backlight)),
            enable: state_of(byte.check_bit(self.en)),
            nibble,
        }
    }

    /// Drive the enable line of an already composed byte
    pub fn with_enable(&self, byte: u8, enable: State) -> u8 {
        byte.put_bit(self.en, (enable == State::On).into())
    }
}

fn state_of(bit: BitState) -> State {
    match bit {
        BitState::Set => State::On,
        BitState::Clear => State::Off,
    }
}

/// Logical level of every signal line for one expander write
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lines {
    /// RS line, command or data
    pub register_selection: RegisterSelection,
    /// Backlight transistor
    pub backlight: State,
    /// E line
    pub enable: State,
    /// DB4..DB7, bit 0 is DB4
    pub nibble: u8,
}

impl Lines {
    /// Lines for one nibble with enable low, only the lower 4 bits of
    /// `nibble` are used
    pub fn new(register_selection: RegisterSelection, backlight: State, nibble: u8) -> Self {
        Self {
            register_selection,
            backlight,
            enable: State::Off,
            nibble: nibble & 0x0F,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn pcf8574_wiring_is_valid() {
        let pins = PinMap::pcf8574();
        assert_eq!(PinMap::new(0, 1, 2, 4, 5, 6, 7, 3), Ok(pins));
        assert_eq!(pins.position(PinLine::Enable), 2);
        assert_eq!(pins.position(PinLine::Db7), 7);
        assert_eq!(PinMap::default(), pins);
    }

    #[test]
    fn overlapping_pins_are_rejected() {
        assert_eq!(
            PinMap::new(0, 1, 2, 4, 5, 6, 7, 2),
            Err(Error::PinOverlap {
                line: PinLine::Backlight,
                other: PinLine::Enable,
                position: 2,
            })
        );
    }

    #[test]
    fn out_of_range_pins_are_rejected() {
        assert_eq!(
            PinMap::new(0, 1, 2, 4, 5, 6, 8, 3),
            Err(Error::PinOutOfRange {
                line: PinLine::Db7,
                position: 8,
            })
        );
    }

    #[test]
    fn compose_places_named_lines() {
        let pins = PinMap::pcf8574();

        let command = Lines::new(RegisterSelection::Command, State::On, 0b0010);
        assert_eq!(pins.compose(command), 0b0010_1000);

        let data = Lines::new(RegisterSelection::Data, State::Off, 0b1111);
        assert_eq!(pins.compose(data), 0b1111_0001);

        let byte = pins.compose(command);
        assert_eq!(pins.with_enable(byte, State::On), 0b0010_1100);
        assert_eq!(pins.with_enable(0b0010_1100, State::Off), byte);
    }

    #[test]
    fn lines_drop_upper_nibble_bits() {
        let lines = Lines::new(RegisterSelection::Data, State::On, 0xA5);
        assert_eq!(lines.nibble, 0x05);
    }

    fn any_pin_map() -> impl Strategy<Value = PinMap> {
        Just(std::vec![0u8, 1, 2, 3, 4, 5, 6, 7])
            .prop_shuffle()
            .prop_map(|p| PinMap::new(p[0], p[1], p[2], p[3], p[4], p[5], p[6], p[7]).unwrap())
    }

    proptest! {
        #[test]
        fn compose_then_decompose_recovers_lines(
            pins in any_pin_map(),
            nibble in 0u8..16,
            data in any::<bool>(),
            backlight in any::<bool>(),
            enable in any::<bool>(),
        ) {
            let register_selection = if data {
                RegisterSelection::Data
            } else {
                RegisterSelection::Command
            };
            let lines = Lines {
                register_selection,
                backlight: if backlight { State::On } else { State::Off },
                enable: if enable { State::On } else { State::Off },
                nibble,
            };
            let byte = pins.compose(lines);
            prop_assert_eq!(pins.decompose(byte), lines);
            prop_assert!(!byte.has_bit(pins.position(PinLine::ReadWrite)));
        }
    }
}
