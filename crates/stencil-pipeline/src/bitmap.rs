//! Bit-packed binary canvas.
//!
//! Stores one bit per pixel in `u64` words, row-major. A 4096×4096
//! canvas fits in 2 MiB, so cloning a working copy for destructive
//! contour extraction stays cheap.

use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

const WORD_BITS: u32 = u64::BITS;

/// A binary image: `true` is opaque, `false` is transparent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitmap {
    width: u32,
    height: u32,
    words_per_row: usize,
    words: Vec<u64>,
}

impl Bitmap {
    /// Create an all-transparent bitmap.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        let words_per_row = (width as usize).div_ceil(WORD_BITS as usize);
        Self {
            width,
            height,
            words_per_row,
            words: vec![0; words_per_row * height as usize],
        }
    }

    /// Width in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// Width and height together.
    #[must_use]
    pub const fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    const fn index(&self, x: u32, y: u32) -> (usize, u64) {
        let word = y as usize * self.words_per_row + (x / WORD_BITS) as usize;
        let mask = 1_u64 << (x % WORD_BITS);
        (word, mask)
    }

    /// Pixel value at `(x, y)`. Out-of-range coordinates read as
    /// transparent, which lets boundary walks probe neighbours without
    /// range checks.
    #[must_use]
    pub fn get(&self, x: i32, y: i32) -> bool {
        if x < 0 || y < 0 {
            return false;
        }
        let (x, y) = (x.unsigned_abs(), y.unsigned_abs());
        if x >= self.width || y >= self.height {
            return false;
        }
        let (word, mask) = self.index(x, y);
        self.words[word] & mask != 0
    }

    /// Set the pixel at `(x, y)`. Coordinates must be in range.
    pub fn set(&mut self, x: u32, y: u32, value: bool) {
        debug_assert!(x < self.width && y < self.height);
        let (word, mask) = self.index(x, y);
        if value {
            self.words[word] |= mask;
        } else {
            self.words[word] &= !mask;
        }
    }

    /// Toggle the pixel at `(x, y)`. Coordinates must be in range.
    pub fn flip(&mut self, x: u32, y: u32) {
        debug_assert!(x < self.width && y < self.height);
        let (word, mask) = self.index(x, y);
        self.words[word] ^= mask;
    }

    /// Number of opaque pixels.
    #[must_use]
    pub fn count_opaque(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// Whether no pixel is opaque.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// The first opaque pixel in raster order (top-to-bottom, then
    /// left-to-right), or `None` if the bitmap is blank.
    #[must_use]
    pub fn first_opaque(&self) -> Option<(u32, u32)> {
        for y in 0..self.height {
            let row_start = y as usize * self.words_per_row;
            let row = &self.words[row_start..row_start + self.words_per_row];
            for (wi, &word) in row.iter().enumerate() {
                if word != 0 {
                    #[allow(clippy::cast_possible_truncation)]
                    let x = wi as u32 * WORD_BITS + word.trailing_zeros();
                    return Some((x, y));
                }
            }
        }
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn new_bitmap_is_blank() {
        let bitmap = Bitmap::new(100, 50);
        assert!(bitmap.is_blank());
        assert_eq!(bitmap.count_opaque(), 0);
        assert_eq!(bitmap.dimensions(), Dimensions::new(100, 50));
    }

    #[test]
    fn set_and_get_round_trip() {
        let mut bitmap = Bitmap::new(130, 3);
        bitmap.set(0, 0, true);
        bitmap.set(63, 1, true);
        bitmap.set(64, 1, true);
        bitmap.set(129, 2, true);

        assert!(bitmap.get(0, 0));
        assert!(bitmap.get(63, 1));
        assert!(bitmap.get(64, 1));
        assert!(bitmap.get(129, 2));
        assert!(!bitmap.get(1, 0));
        assert_eq!(bitmap.count_opaque(), 4);

        bitmap.set(63, 1, false);
        assert!(!bitmap.get(63, 1));
        assert_eq!(bitmap.count_opaque(), 3);
    }

    #[test]
    fn out_of_range_reads_transparent() {
        let mut bitmap = Bitmap::new(4, 4);
        bitmap.set(0, 0, true);
        assert!(!bitmap.get(-1, 0));
        assert!(!bitmap.get(0, -1));
        assert!(!bitmap.get(4, 0));
        assert!(!bitmap.get(0, 4));
    }

    #[test]
    fn flip_toggles() {
        let mut bitmap = Bitmap::new(8, 8);
        bitmap.flip(3, 3);
        assert!(bitmap.get(3, 3));
        bitmap.flip(3, 3);
        assert!(!bitmap.get(3, 3));
    }

    #[test]
    fn first_opaque_scans_raster_order() {
        let mut bitmap = Bitmap::new(128, 4);
        assert_eq!(bitmap.first_opaque(), None);

        bitmap.set(100, 2, true);
        assert_eq!(bitmap.first_opaque(), Some((100, 2)));

        // Earlier row wins even at a larger x.
        bitmap.set(120, 1, true);
        assert_eq!(bitmap.first_opaque(), Some((120, 1)));

        // Same row: smaller x wins.
        bitmap.set(5, 1, true);
        assert_eq!(bitmap.first_opaque(), Some((5, 1)));
    }

    #[test]
    fn zero_width_bitmap_is_blank() {
        let bitmap = Bitmap::new(0, 10);
        assert!(bitmap.is_blank());
        assert_eq!(bitmap.first_opaque(), None);
    }
}
