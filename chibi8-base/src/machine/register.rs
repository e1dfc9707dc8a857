use num_enum::{IntoPrimitive, TryFromPrimitive, UnsafeFromPrimitive};
use static_assertions::const_assert;

use crate::nibbles::Nibble;

/// A general-purpose data register, V0 through VF.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    TryFromPrimitive,
    IntoPrimitive,
    UnsafeFromPrimitive,
)]
#[repr(u8)]
pub enum Register {
    /// Also the offset register of the jump-with-offset instruction.
    V0,
    V1,
    V2,
    V3,
    V4,
    V5,
    V6,
    V7,
    V8,
    V9,
    VA,
    VB,
    VC,
    VD,
    VE,
    /// Doubles as the flag register: carries, borrows, shifted-out bits
    /// and sprite collisions land here, overwriting whatever a program
    /// stored in it.
    VF,
}

impl Register {
    /// Number of data registers in the register file.
    pub const COUNT: usize = 16;
}

const_assert!(Register::COUNT == Nibble::MAX.into_usize() + 1);

impl From<Register> for Nibble {
    fn from(register: Register) -> Self {
        Nibble::low(register as u8)
    }
}

impl From<Nibble> for Register {
    fn from(val: Nibble) -> Self {
        // SAFETY: Register has exactly Nibble::MAX + 1 variants.
        unsafe { Register::from_unchecked(val.into_u8()) }
    }
}
