use std::convert::TryFrom;

use derive_more::{Display, Into};
use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
#[error("value {value} is out of range, the maximum is {max}")]
pub struct OutOfRangeError {
    value: usize,
    max: usize,
}

/// A 4-bit integer: register numbers, ALU sub-codes and sprite heights
/// in instruction operand fields.
/// Need not actually use only 4 bits in memory.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Into, Display)]
#[repr(transparent)]
pub struct Nibble(u8);

impl Nibble {
    pub const MAX: Self = Self(0xF);

    /// The high nibble of `byte`.
    pub const fn high(byte: u8) -> Self {
        Self(byte >> 4)
    }

    /// The low nibble of `byte`.
    pub const fn low(byte: u8) -> Self {
        Self(byte & 0xF)
    }

    pub const fn into_u8(self) -> u8 {
        self.0
    }

    pub const fn into_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u8> for Nibble {
    type Error = OutOfRangeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(OutOfRangeError {
                value: value as usize,
                max: Self::MAX.0 as usize,
            })
        }
    }
}

/// A 12-bit integer: the address width of the instruction set.
/// Need not actually use only 12 bits in memory.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Into, Display)]
#[repr(transparent)]
pub struct Address(u16);

impl Address {
    pub const MAX: Self = Self(0x0FFF);

    /// The low 12 bits of `word`, i.e. the NNN operand of an instruction.
    pub const fn masked(word: u16) -> Self {
        Self(word & Self::MAX.0)
    }

    pub const fn into_u16(self) -> u16 {
        self.0
    }

    pub const fn into_usize(self) -> usize {
        self.0 as usize
    }
}

impl TryFrom<u16> for Address {
    type Error = OutOfRangeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        if value <= Self::MAX.0 {
            Ok(Self(value))
        } else {
            Err(OutOfRangeError {
                value: value as usize,
                max: Self::MAX.0 as usize,
            })
        }
    }
}
