use static_assertions::const_assert;

/// Memory offset at which the built-in glyph set is installed.
///
/// Historical interpreters lived in the first 512 bytes of memory and
/// stashed the glyphs somewhere in there; 0x050 is the customary spot.
pub const GLYPHS_START: u16 = 0x050;

/// Bytes of sprite data per glyph.
pub const GLYPH_LEN: u16 = 5;

/// Sprite data for the sixteen hexadecimal digit glyphs, 0 through F.
///
/// Each glyph is one byte wide with the symbol in the high nibble,
/// [`GLYPH_LEN`] rows tall.
pub const GLYPHS: [u8; 80] = [
    0xF0, 0x90, 0x90, 0x90, 0xF0, // 0
    0x20, 0x60, 0x20, 0x20, 0x70, // 1
    0xF0, 0x10, 0xF0, 0x80, 0xF0, // 2
    0xF0, 0x10, 0xF0, 0x10, 0xF0, // 3
    0x90, 0x90, 0xF0, 0x10, 0x10, // 4
    0xF0, 0x80, 0xF0, 0x10, 0xF0, // 5
    0xF0, 0x80, 0xF0, 0x90, 0xF0, // 6
    0xF0, 0x10, 0x20, 0x40, 0x40, // 7
    0xF0, 0x90, 0xF0, 0x90, 0xF0, // 8
    0xF0, 0x90, 0xF0, 0x10, 0xF0, // 9
    0xF0, 0x90, 0xF0, 0x90, 0x90, // A
    0xE0, 0x90, 0xE0, 0x90, 0xE0, // B
    0xF0, 0x80, 0x80, 0x80, 0xF0, // C
    0xE0, 0x90, 0x90, 0x90, 0xE0, // D
    0xF0, 0x80, 0xF0, 0x80, 0xF0, // E
    0xF0, 0x80, 0xF0, 0x80, 0x80, // F
];

const_assert!(GLYPHS.len() == GLYPH_LEN as usize * 16);

/// The memory address of the glyph for the hex digit in the low nibble
/// of `digit`. The high nibble is ignored.
pub const fn glyph_addr(digit: u8) -> u16 {
    GLYPHS_START + (digit & 0xF) as u16 * GLYPH_LEN
}
