use num_enum::{IntoPrimitive, TryFromPrimitive, UnsafeFromPrimitive};
use static_assertions::const_assert;

use crate::nibbles::Nibble;

/// A key of the hexadecimal keypad.
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
pub enum Key {
    K0,
    K1,
    K2,
    K3,
    K4,
    K5,
    K6,
    K7,
    K8,
    K9,
    KA,
    KB,
    KC,
    KD,
    KE,
    KF,
}

impl Key {
    /// Number of keys on the keypad.
    pub const COUNT: usize = 16;
}

const_assert!(Key::COUNT == Nibble::MAX.into_usize() + 1);

impl From<Key> for Nibble {
    fn from(key: Key) -> Self {
        Nibble::low(key as u8)
    }
}

impl From<Nibble> for Key {
    fn from(val: Nibble) -> Self {
        // SAFETY: Key has exactly Nibble::MAX + 1 variants.
        unsafe { Key::from_unchecked(val.into_u8()) }
    }
}

/// The host-reported state of a single [`Key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Pressed,
    NotPressed,
}

impl Default for KeyState {
    fn default() -> Self {
        Self::NotPressed
    }
}
