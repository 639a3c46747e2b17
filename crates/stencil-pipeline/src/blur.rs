//! Gaussian blur for noise reduction before thresholding.
//!
//! Wraps [`imageproc::filter::gaussian_blur_f32`] to smooth images so
//! isolated dark pixels and compression artifacts do not survive the
//! threshold as speckles.
//!
//! The pipeline works in RGBA throughout (alpha gates the threshold),
//! so [`gaussian_blur_rgba`] blurs each of the four channels
//! independently and reassembles.

use image::GrayImage;

use crate::types::RgbaImage;

/// Apply Gaussian blur to an RGBA image by blurring each channel
/// independently.
///
/// `imageproc::filter::gaussian_blur_f32` only accepts `GrayImage`, so
/// this splits the image into four single-channel planes, blurs each,
/// and reassembles. Gaussian blur is a linear per-channel operation, so
/// the result matches blurring in colour space. Alpha is blurred along
/// with the colour channels, softening the opacity gate at feathered
/// edges.
///
/// Non-positive sigma values (zero or negative) return the image
/// unchanged, since the underlying `imageproc` function panics on
/// `sigma <= 0.0`.
#[must_use = "returns the blurred RGBA image"]
pub fn gaussian_blur_rgba(image: &RgbaImage, sigma: f32) -> RgbaImage {
    if sigma <= 0.0 {
        return image.clone();
    }

    let (w, h) = image.dimensions();

    let planes: [GrayImage; 4] = std::array::from_fn(|c| {
        let plane = GrayImage::from_fn(w, h, |x, y| image::Luma([image.get_pixel(x, y).0[c]]));
        imageproc::filter::gaussian_blur_f32(&plane, sigma)
    });

    RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba(planes.each_ref().map(|plane| plane.get_pixel(x, y).0[0]))
    })
}
