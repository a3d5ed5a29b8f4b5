//! Common tools
//!
//! Bit level helpers used to place logical signal lines onto the byte that
//! goes out on the bus.

use core::fmt;

/// The state of a bit,
/// It's either [`BitState::Clear`] to represent a 0
/// or [`BitState::Set`] to represent a 1
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BitState {
    /// Bit is 0
    Clear,
    /// Bit is 1
    Set,
}

impl From<bool> for BitState {
    fn from(value: bool) -> Self {
        match value {
            true => BitState::Set,
            false => BitState::Clear,
        }
    }
}

/// Simple bit ops
///
/// All methods take the value by copy and return a new one, so they can be
/// chained while composing a byte.
///
/// `pos` must be a valid bit offset (0..=7 for [`u8`]).
pub trait BitOps: Copy {
    /// Return `self` with bit `pos` forced to 1
    fn set_bit(self, pos: u8) -> Self;
    /// Return `self` with bit `pos` forced to 0
    fn clear_bit(self, pos: u8) -> Self;
    #[allow(missing_docs)]
    fn check_bit(self, pos: u8) -> BitState;

    /// `true` when bit `pos` is 1
    fn has_bit(self, pos: u8) -> bool {
        self.check_bit(pos) == BitState::Set
    }

    /// Force bit `pos` to the given state
    fn put_bit(self, pos: u8, state: BitState) -> Self {
        match state {
            BitState::Set => self.set_bit(pos),
            BitState::Clear => self.clear_bit(pos),
        }
    }
}

impl BitOps for u8 {
    fn set_bit(self, pos: u8) -> Self {
        assert!(pos <= 7, "bit offset larger than 7");
        self | (1u8 << pos)
    }

    fn clear_bit(self, pos: u8) -> Self {
        assert!(pos <= 7, "bit offset larger than 7");
        self & !(1u8 << pos)
    }

    fn check_bit(self, pos: u8) -> BitState {
        assert!(pos <= 7, "bit offset larger than 7");
        BitState::from((self >> pos) & 1 == 1)
    }
}

/// Renders a byte as its bit pattern, bit 7 first, `1` for a set bit and `-`
/// for a clear one
///
/// `0b0010_1100` shows as `--1-11--`
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct BitPattern(pub u8);

impl fmt::Display for BitPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for pos in (0..8).rev() {
            let c = if self.0.has_bit(pos) { '1' } else { '-' };
            fmt::Write::write_char(f, c)?;
        }
        Ok(())
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for BitPattern {
    fn format(&self, f: defmt::Formatter) {
        for pos in (0..8).rev() {
            let c = if self.0.has_bit(pos) { '1' } else { '-' };
            defmt::write!(f, "{}", c);
        }
    }
}
