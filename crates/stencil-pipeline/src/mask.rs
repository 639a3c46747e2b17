//! Binary mask rendering.
//!
//! Converts a [`Bitmap`] back into RGBA pixels for the caller to
//! encode: opaque pixels become pure black at full alpha, transparent
//! pixels white at zero alpha. The white colour under zero alpha keeps
//! straight-alpha consumers from bleeding dark fringes at mask edges.

use crate::bitmap::Bitmap;
use crate::types::RgbaImage;

/// RGBA value written for opaque mask pixels.
pub const OPAQUE_PIXEL: [u8; 4] = [0, 0, 0, 255];

/// RGBA value written for transparent mask pixels.
pub const TRANSPARENT_PIXEL: [u8; 4] = [255, 255, 255, 0];

/// Render a bitmap as a black/transparent RGBA mask.
#[must_use]
pub fn to_mask_image(bitmap: &Bitmap) -> RgbaImage {
    RgbaImage::from_fn(bitmap.width(), bitmap.height(), |x, y| {
        #[allow(clippy::cast_possible_wrap)]
        if bitmap.get(x as i32, y as i32) {
            image::Rgba(OPAQUE_PIXEL)
        } else {
            image::Rgba(TRANSPARENT_PIXEL)
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mask_pixels_use_exact_constants() {
        let mut bitmap = Bitmap::new(2, 1);
        bitmap.set(0, 0, true);

        let mask = to_mask_image(&bitmap);
        assert_eq!(mask.get_pixel(0, 0).0, OPAQUE_PIXEL);
        assert_eq!(mask.get_pixel(1, 0).0, TRANSPARENT_PIXEL);
    }

    #[test]
    fn mask_dimensions_match_bitmap() {
        let bitmap = Bitmap::new(7, 13);
        let mask = to_mask_image(&bitmap);
        assert_eq!(mask.width(), 7);
        assert_eq!(mask.height(), 13);
    }

    #[test]
    fn blank_bitmap_renders_fully_transparent() {
        let mask = to_mask_image(&Bitmap::new(4, 4));
        assert!(mask.pixels().all(|p| p.0 == TRANSPARENT_PIXEL));
    }
}
