use std::fmt::{self, Debug, Write};

/// The monochrome display buffer.
///
/// [`Screen::HEIGHT`] rows of [`Screen::WIDTH`] one-bit pixels, packed
/// row-major into bytes with the most significant bit leftmost. Hosts read
/// it via [`Screen::pixel`] or [`Screen::as_bytes`]; only the display
/// instructions mutate it.
///
/// The alternate `Debug` format (`{:#?}`) renders the pixel grid as `#`
/// and `_` characters, which makes failed display assertions readable.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Screen {
    pixels: [u8; Self::WIDTH_BYTES * Self::HEIGHT],
}

impl Screen {
    /// Width of one pixel row in bytes.
    pub const WIDTH_BYTES: usize = 8;
    /// Screen width in pixels.
    pub const WIDTH: usize = Self::WIDTH_BYTES * 8;
    /// Screen height in pixels.
    pub const HEIGHT: usize = 32;

    /// Whether the pixel at `(x, y)` is set. Coordinates wrap around
    /// their respective axes.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        let x = x % Self::WIDTH;
        let y = y % Self::HEIGHT;

        self.pixels[y * Self::WIDTH_BYTES + x / 8] & (0x80 >> (x % 8)) != 0
    }

    /// The packed pixel bytes, row-major, [`Screen::WIDTH_BYTES`] per row,
    /// most significant bit leftmost.
    pub fn as_bytes(&self) -> &[u8] {
        &self.pixels
    }

    /// XOR `sprite` onto the screen with its top-left corner at `(x, y)`.
    ///
    /// Each sprite byte is one 8-pixel row. Every pixel wraps around both
    /// axes independently, so sprites drawn near an edge continue on the
    /// opposite side. Returns true if any pixel was turned off by the
    /// draw.
    pub(crate) fn draw_sprite(&mut self, x: u8, y: u8, sprite: &[u8]) -> bool {
        let mut collision = false;

        for (row_offset, row) in sprite.iter().copied().enumerate() {
            let y = (y as usize + row_offset) % Self::HEIGHT;

            for bit in 0..8 {
                if row & (0x80 >> bit) == 0 {
                    continue;
                }

                let x = (x as usize + bit) % Self::WIDTH;
                collision |= self.xor_pixel(x, y);
            }
        }

        collision
    }

    /// XOR a single pixel, returning true if it went from set to unset.
    /// Callers pass in-range coordinates.
    fn xor_pixel(&mut self, x: usize, y: usize) -> bool {
        let byte = &mut self.pixels[y * Self::WIDTH_BYTES + x / 8];
        let mask = 0x80 >> (x % 8);
        let was_set = *byte & mask != 0;

        *byte ^= mask;

        was_set
    }

    pub(crate) fn clear(&mut self) {
        self.pixels = [0; Self::WIDTH_BYTES * Self::HEIGHT];
    }
}

impl Default for Screen {
    fn default() -> Self {
        Self {
            pixels: [0; Self::WIDTH_BYTES * Self::HEIGHT],
        }
    }
}

impl Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            writeln!(f, "Screen(")?;

            for row in self.pixels.chunks_exact(Self::WIDTH_BYTES) {
                for byte in row.iter().copied() {
                    for bit in (0..8).rev() {
                        f.write_char(if byte >> bit & 1 > 0 { '#' } else { '_' })?;
                    }
                }
                f.write_char('\n')?;
            }

            write!(f, ")")
        } else {
            f.debug_tuple("Screen").field(&&self.pixels[..]).finish()
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn draw_sets_pixels_without_collision() {
        let mut screen = Screen::default();

        let collision = screen.draw_sprite(8, 4, &[0b1100_0000, 0b0100_0000]);

        assert!(!collision);
        assert!(screen.pixel(8, 4));
        assert!(screen.pixel(9, 4));
        assert!(!screen.pixel(8, 5));
        assert!(screen.pixel(9, 5));
    }

    #[test]
    fn redrawing_a_sprite_erases_it_and_collides() {
        let mut screen = Screen::default();
        screen.draw_sprite(10, 10, &[0xFF, 0x81]);

        let collision = screen.draw_sprite(10, 10, &[0xFF, 0x81]);

        assert!(collision);
        assert!(screen.as_bytes().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn pixels_wrap_around_both_axes() {
        let mut screen = Screen::default();

        screen.draw_sprite(60, 31, &[0xFF, 0xFF]);

        // Right half of each row wraps to x = 0..4, second row to y = 0.
        assert!(screen.pixel(60, 31));
        assert!(screen.pixel(63, 31));
        assert!(screen.pixel(0, 31));
        assert!(screen.pixel(3, 31));
        assert!(!screen.pixel(4, 31));
        assert!(screen.pixel(60, 0));
        assert!(screen.pixel(3, 0));
        assert!(!screen.pixel(4, 0));
    }

    #[test]
    fn clear_unsets_every_pixel() {
        let mut screen = Screen::default();
        screen.draw_sprite(0, 0, &[0xFF; 15]);

        screen.clear();

        assert!(screen.as_bytes().iter().all(|&byte| byte == 0));
    }

    #[test]
    fn alternate_debug_renders_a_grid() {
        let mut screen = Screen::default();
        screen.draw_sprite(0, 0, &[0b1010_0000]);

        let rendered = format!("{:#?}", screen);

        assert!(rendered.starts_with("Screen(\n#_#_"));
    }
}
