//! Binarization: luma thresholding with optional dithering.
//!
//! A pixel becomes opaque iff its luma falls below the configured
//! threshold and its alpha is non-zero. Fully transparent pixels never
//! become opaque no matter how dark their colour channels are.

use image::RgbaImage;
use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;

/// Dithering applied to luma before the threshold comparison.
///
/// Both patterns are fixed and position-derived, so binarization stays
/// deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherMode {
    /// Plain thresholding, no dithering.
    #[default]
    None,
    /// Ordered dithering with a 4×4 Bayer matrix.
    Ordered,
    /// Floyd–Steinberg error diffusion.
    ErrorDiffusion,
}

/// The standard 4×4 Bayer threshold matrix.
const BAYER_4X4: [[f32; 4]; 4] = [
    [0.0, 8.0, 2.0, 10.0],
    [12.0, 4.0, 14.0, 6.0],
    [3.0, 11.0, 1.0, 9.0],
    [15.0, 7.0, 13.0, 5.0],
];

/// Luma amplitude of the ordered-dither bias (one quarter of the full
/// range, centred on zero).
const ORDERED_SPREAD: f32 = 64.0;

/// Rec. 601 luma from 8-bit colour channels, in `0.0..=255.0`.
#[must_use]
pub fn luma(r: u8, g: u8, b: u8) -> f32 {
    0.299_f32.mul_add(f32::from(r), 0.587_f32.mul_add(f32::from(g), 0.114 * f32::from(b)))
}

/// Replace every pixel's colour with its luma, keeping alpha.
///
/// Used when the pipeline is configured to convert to grayscale before
/// blurring and resampling rather than after.
#[must_use]
pub fn grayscale_rgba(image: &RgbaImage) -> RgbaImage {
    let mut out = image.clone();
    for pixel in out.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let gray = luma(r, g, b).round().clamp(0.0, 255.0) as u8;
        pixel.0 = [gray, gray, gray, a];
    }
    out
}

/// Binarize an image into a [`Bitmap`].
///
/// Opaque iff `luma < threshold && alpha > 0`, with the luma optionally
/// perturbed by the selected dither pattern first.
#[must_use]
pub fn binarize(image: &RgbaImage, threshold: u8, dither: DitherMode) -> Bitmap {
    match dither {
        DitherMode::None => binarize_plain(image, threshold),
        DitherMode::Ordered => binarize_ordered(image, threshold),
        DitherMode::ErrorDiffusion => binarize_diffused(image, threshold),
    }
}

fn binarize_plain(image: &RgbaImage, threshold: u8) -> Bitmap {
    let mut bitmap = Bitmap::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        if a > 0 && luma(r, g, b) < f32::from(threshold) {
            bitmap.set(x, y, true);
        }
    }
    bitmap
}

fn binarize_ordered(image: &RgbaImage, threshold: u8) -> Bitmap {
    let mut bitmap = Bitmap::new(image.width(), image.height());
    for (x, y, pixel) in image.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }
        let cell = BAYER_4X4[(y % 4) as usize][(x % 4) as usize];
        let bias = ((cell + 0.5) / 16.0 - 0.5) * ORDERED_SPREAD;
        if luma(r, g, b) + bias < f32::from(threshold) {
            bitmap.set(x, y, true);
        }
    }
    bitmap
}

fn binarize_diffused(image: &RgbaImage, threshold: u8) -> Bitmap {
    let width = image.width() as usize;
    let mut bitmap = Bitmap::new(image.width(), image.height());
    if width == 0 {
        return bitmap;
    }

    // Error carried into the current and the next row.
    let mut current = vec![0.0_f32; width];
    let mut next = vec![0.0_f32; width];

    for y in 0..image.height() {
        for x in 0..image.width() {
            let xi = x as usize;
            let [r, g, b, a] = image.get_pixel(x, y).0;
            if a == 0 {
                // Transparent pixels stay transparent and neither
                // absorb nor propagate error.
                continue;
            }
            let value = luma(r, g, b) + current[xi];
            let opaque = value < f32::from(threshold);
            if opaque {
                bitmap.set(x, y, true);
            }
            let error = if opaque { value } else { value - 255.0 };

            if xi + 1 < width {
                current[xi + 1] += error * (7.0 / 16.0);
                next[xi + 1] += error * (1.0 / 16.0);
            }
            if xi > 0 {
                next[xi - 1] += error * (3.0 / 16.0);
            }
            next[xi] += error * (5.0 / 16.0);
        }
        std::mem::swap(&mut current, &mut next);
        next.fill(0.0);
    }
    bitmap
}
