//! Instruction words and their decoded form.
//!
//! An instruction word is two big-endian bytes. [`Instruction`] decodes
//! from a byte pair via [`TryFrom`] and encodes back via [`From`], so the
//! codec round-trips and tests can assemble programs from typed values.

use thiserror::Error;

use crate::machine::Register;
pub use crate::nibbles::{Address, Nibble, OutOfRangeError};

/// Error for an instruction word that does not decode to any
/// [`Instruction`].
///
/// Machine-routine words (`0NNN` other than clear and return) fall under
/// this as well. They dispatched to host-CPU code on the original
/// hardware and no program relying on them can run here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unrecognized instruction word {word:#06X}")]
pub struct DecodeError {
    /// The raw instruction word that failed to decode.
    pub word: u16,
}

/// A decoded instruction.
///
/// Operands are typed: data registers as [`Register`], 12-bit addresses
/// as [`Address`], 4-bit immediates as [`Nibble`] and byte immediates as
/// plain `u8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// `00E0`: Turn every pixel of the display off.
    ClearDisplay,
    /// `00EE`: Return from the current subroutine.
    Return,
    /// `1NNN`: Jump to `address`.
    Jump { address: Address },
    /// `2NNN`: Call the subroutine at `address`.
    CallSubroutine { address: Address },
    /// `3XNN`: Skip the next instruction if `register` equals `value`.
    SkipIfEqualsValue { register: Register, value: u8 },
    /// `4XNN`: Skip the next instruction if `register` does not equal
    /// `value`.
    SkipIfNotEqualsValue { register: Register, value: u8 },
    /// `5XY0`: Skip the next instruction if `register` equals `other`.
    SkipIfEqualsRegister { register: Register, other: Register },
    /// `6XNN`: Set `register` to `value`.
    SetValue { register: Register, value: u8 },
    /// `7XNN`: Add `value` to `register`, wrapping, without touching the
    /// flag register.
    AddValue { register: Register, value: u8 },
    /// `8XY0`: Copy `source` into `target`.
    Copy { target: Register, source: Register },
    /// `8XY1`: Bitwise-or `source` into `target`.
    Or { target: Register, source: Register },
    /// `8XY2`: Bitwise-and `source` into `target`.
    And { target: Register, source: Register },
    /// `8XY3`: Bitwise-xor `source` into `target`.
    Xor { target: Register, source: Register },
    /// `8XY4`: Add `source` to `target`; VF becomes 1 on carry, else 0.
    Add { target: Register, source: Register },
    /// `8XY5`: Subtract `source` from `target`; VF becomes 0 on borrow,
    /// else 1.
    Sub { target: Register, source: Register },
    /// `8XY6`: Set `target` to `source` shifted right by one; VF receives
    /// the shifted-out low bit. `source` is left unmodified.
    ShiftRight { target: Register, source: Register },
    /// `8XY7`: Set `target` to `source` minus `target`; VF becomes 0 on
    /// borrow, else 1.
    SubReversed { target: Register, source: Register },
    /// `8XYE`: Set `target` to `source` shifted left by one; VF receives
    /// the masked-out high bit, `0x00` or `0x80`. `source` is left
    /// unmodified.
    ShiftLeft { target: Register, source: Register },
    /// `9XY0`: Skip the next instruction if `register` does not equal
    /// `other`.
    SkipIfNotEqualsRegister { register: Register, other: Register },
    /// `ANNN`: Set the index register to `address`.
    SetIndex { address: Address },
    /// `BNNN`: Jump to `address` plus the value of V0.
    JumpWithOffset { address: Address },
    /// `CXNN`: Set `register` to a random byte bitwise-anded with `mask`.
    Random { register: Register, mask: u8 },
    /// `DXYN`: Draw the `height`-row sprite addressed by the index
    /// register at the position given by `x_register` and `y_register`;
    /// VF becomes 1 if a pixel was turned off, else 0.
    Draw {
        x_register: Register,
        y_register: Register,
        height: Nibble,
    },
    /// `EX9E`: Skip the next instruction if the key named by the low
    /// nibble of `register` is pressed.
    SkipIfKeyPressed { register: Register },
    /// `EXA1`: Skip the next instruction if the key named by the low
    /// nibble of `register` is not pressed.
    SkipIfKeyNotPressed { register: Register },
    /// `FX07`: Read the delay timer into `register`.
    ReadDelayTimer { register: Register },
    /// `FX0A`: Block until a fresh keypress arrives, then store the key
    /// value in `register`.
    WaitForKey { register: Register },
    /// `FX15`: Set the delay timer to the value of `register`.
    SetDelayTimer { register: Register },
    /// `FX18`: Set the sound timer to the value of `register`.
    SetSoundTimer { register: Register },
    /// `FX1E`: Add the value of `register` to the index register; VF
    /// becomes 1 on 16-bit overflow and is untouched otherwise.
    AddToIndex { register: Register },
    /// `FX29`: Point the index register at the built-in glyph for the
    /// hex digit in the low nibble of `register`.
    SetIndexToGlyph { register: Register },
    /// `FX33`: Store the decimal digits of `register` at the index
    /// register address (hundreds first).
    StoreBcd { register: Register },
    /// `FX55`: Store V0 through `last` to memory at the index register,
    /// which then advances past the stored bytes.
    StoreRegisters { last: Register },
    /// `FX65`: Load V0 through `last` from memory at the index register,
    /// which then advances past the loaded bytes.
    LoadRegisters { last: Register },
}

impl TryFrom<[u8; 2]> for Instruction {
    type Error = DecodeError;

    fn try_from(bytes: [u8; 2]) -> Result<Self, Self::Error> {
        let [hi, lo] = bytes;
        let x = Register::from(Nibble::low(hi));
        let y = Register::from(Nibble::high(lo));
        let n = Nibble::low(lo);
        let nn = lo;
        let nnn = Address::masked(u16::from_be_bytes(bytes));

        Ok(match (hi >> 4, hi & 0xF, lo >> 4, lo & 0xF) {
            (0x0, 0x0, 0xE, 0x0) => Self::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Self::Return,
            (0x1, ..) => Self::Jump { address: nnn },
            (0x2, ..) => Self::CallSubroutine { address: nnn },
            (0x3, ..) => Self::SkipIfEqualsValue {
                register: x,
                value: nn,
            },
            (0x4, ..) => Self::SkipIfNotEqualsValue {
                register: x,
                value: nn,
            },
            (0x5, _, _, 0x0) => Self::SkipIfEqualsRegister {
                register: x,
                other: y,
            },
            (0x6, ..) => Self::SetValue {
                register: x,
                value: nn,
            },
            (0x7, ..) => Self::AddValue {
                register: x,
                value: nn,
            },
            (0x8, _, _, 0x0) => Self::Copy {
                target: x,
                source: y,
            },
            (0x8, _, _, 0x1) => Self::Or {
                target: x,
                source: y,
            },
            (0x8, _, _, 0x2) => Self::And {
                target: x,
                source: y,
            },
            (0x8, _, _, 0x3) => Self::Xor {
                target: x,
                source: y,
            },
            (0x8, _, _, 0x4) => Self::Add {
                target: x,
                source: y,
            },
            (0x8, _, _, 0x5) => Self::Sub {
                target: x,
                source: y,
            },
            (0x8, _, _, 0x6) => Self::ShiftRight {
                target: x,
                source: y,
            },
            (0x8, _, _, 0x7) => Self::SubReversed {
                target: x,
                source: y,
            },
            (0x8, _, _, 0xE) => Self::ShiftLeft {
                target: x,
                source: y,
            },
            (0x9, _, _, 0x0) => Self::SkipIfNotEqualsRegister {
                register: x,
                other: y,
            },
            (0xA, ..) => Self::SetIndex { address: nnn },
            (0xB, ..) => Self::JumpWithOffset { address: nnn },
            (0xC, ..) => Self::Random {
                register: x,
                mask: nn,
            },
            (0xD, ..) => Self::Draw {
                x_register: x,
                y_register: y,
                height: n,
            },
            (0xE, _, 0x9, 0xE) => Self::SkipIfKeyPressed { register: x },
            (0xE, _, 0xA, 0x1) => Self::SkipIfKeyNotPressed { register: x },
            (0xF, _, 0x0, 0x7) => Self::ReadDelayTimer { register: x },
            (0xF, _, 0x0, 0xA) => Self::WaitForKey { register: x },
            (0xF, _, 0x1, 0x5) => Self::SetDelayTimer { register: x },
            (0xF, _, 0x1, 0x8) => Self::SetSoundTimer { register: x },
            (0xF, _, 0x1, 0xE) => Self::AddToIndex { register: x },
            (0xF, _, 0x2, 0x9) => Self::SetIndexToGlyph { register: x },
            (0xF, _, 0x3, 0x3) => Self::StoreBcd { register: x },
            (0xF, _, 0x5, 0x5) => Self::StoreRegisters { last: x },
            (0xF, _, 0x6, 0x5) => Self::LoadRegisters { last: x },
            _ => {
                return Err(DecodeError {
                    word: u16::from_be_bytes(bytes),
                })
            }
        })
    }
}

const fn word_nnn(class: u8, address: Address) -> u16 {
    (class as u16) << 12 | address.into_u16()
}

const fn word_xnn(class: u8, register: Register, value: u8) -> u16 {
    (class as u16) << 12 | (register as u16) << 8 | value as u16
}

const fn word_xy(class: u8, first: Register, second: Register, sub: u8) -> u16 {
    (class as u16) << 12 | (first as u16) << 8 | (second as u16) << 4 | sub as u16
}

impl From<Instruction> for [u8; 2] {
    fn from(instruction: Instruction) -> Self {
        use Instruction::*;

        let word = match instruction {
            ClearDisplay => 0x00E0,
            Return => 0x00EE,
            Jump { address } => word_nnn(0x1, address),
            CallSubroutine { address } => word_nnn(0x2, address),
            SkipIfEqualsValue { register, value } => word_xnn(0x3, register, value),
            SkipIfNotEqualsValue { register, value } => word_xnn(0x4, register, value),
            SkipIfEqualsRegister { register, other } => word_xy(0x5, register, other, 0x0),
            SetValue { register, value } => word_xnn(0x6, register, value),
            AddValue { register, value } => word_xnn(0x7, register, value),
            Copy { target, source } => word_xy(0x8, target, source, 0x0),
            Or { target, source } => word_xy(0x8, target, source, 0x1),
            And { target, source } => word_xy(0x8, target, source, 0x2),
            Xor { target, source } => word_xy(0x8, target, source, 0x3),
            Add { target, source } => word_xy(0x8, target, source, 0x4),
            Sub { target, source } => word_xy(0x8, target, source, 0x5),
            ShiftRight { target, source } => word_xy(0x8, target, source, 0x6),
            SubReversed { target, source } => word_xy(0x8, target, source, 0x7),
            ShiftLeft { target, source } => word_xy(0x8, target, source, 0xE),
            SkipIfNotEqualsRegister { register, other } => word_xy(0x9, register, other, 0x0),
            SetIndex { address } => word_nnn(0xA, address),
            JumpWithOffset { address } => word_nnn(0xB, address),
            Random { register, mask } => word_xnn(0xC, register, mask),
            Draw {
                x_register,
                y_register,
                height,
            } => word_xy(0xD, x_register, y_register, height.into_u8()),
            SkipIfKeyPressed { register } => word_xnn(0xE, register, 0x9E),
            SkipIfKeyNotPressed { register } => word_xnn(0xE, register, 0xA1),
            ReadDelayTimer { register } => word_xnn(0xF, register, 0x07),
            WaitForKey { register } => word_xnn(0xF, register, 0x0A),
            SetDelayTimer { register } => word_xnn(0xF, register, 0x15),
            SetSoundTimer { register } => word_xnn(0xF, register, 0x18),
            AddToIndex { register } => word_xnn(0xF, register, 0x1E),
            SetIndexToGlyph { register } => word_xnn(0xF, register, 0x29),
            StoreBcd { register } => word_xnn(0xF, register, 0x33),
            StoreRegisters { last } => word_xnn(0xF, last, 0x55),
            LoadRegisters { last } => word_xnn(0xF, last, 0x65),
        };

        word.to_be_bytes()
    }
}
