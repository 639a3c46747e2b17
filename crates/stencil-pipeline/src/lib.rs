//! stencil-pipeline: Pure silhouette tracing pipeline (sans-IO).
//!
//! Converts a decoded raster image into a binary black/transparent
//! mask and a forest of closed vector paths through:
//! preprocess (grayscale/blur/downscale) -> threshold -> contour
//! tracing -> simplification -> curve fitting.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! images and returns structured data. Decoding, encoding and any
//! service surface live with the caller (see `stencil-cli`), and SVG
//! serialization lives in `stencil-export`.

pub mod batch;
pub mod bitmap;
pub mod blur;
pub mod contour;
pub mod curve;
pub mod diagnostics;
pub mod downscale;
pub mod mask;
pub mod pipeline;
pub mod simplify;
pub mod threshold;
pub mod types;

pub use bitmap::Bitmap;
pub use contour::{ContourTracer, ContourTracerKind};
pub use curve::{CurveFitter, CurveFitterKind};
pub use diagnostics::TraceDiagnostics;
pub use downscale::DownscaleFilter;
pub use threshold::DitherMode;
pub use types::{
    Contour, CurvePath, Dimensions, ErrorKind, Orientation, Point, Polygon, RgbaImage, Segment,
    TraceConfig, TraceError, TraceResult,
};

/// Run the full tracing pipeline.
///
/// Takes a decoded RGBA image and a configuration, and produces a
/// [`TraceResult`] containing the fitted path forest, the canvas
/// dimensions (needed by export serializers to set the SVG coordinate
/// space), and the binarized bitmap for mask rendering.
///
/// # Pipeline steps
///
/// 1. Canvas validation (zero area, strict size, resource budget)
/// 2. Optional grayscale conversion, Gaussian blur, downscale
/// 3. Luma thresholding with optional dithering
/// 4. Contour tracing (pluggable strategy)
/// 5. Speckle pruning, ring simplification, corner classification
/// 6. Curve fitting (pluggable strategy)
///
/// An all-transparent result is not an error: the path forest is
/// simply empty.
///
/// # Errors
///
/// Returns [`TraceError::EmptyCanvas`], [`TraceError::SizeMismatch`]
/// or [`TraceError::CanvasTooLarge`] for rejected inputs; the
/// processing-class variants ([`TraceError::UnclosedContour`],
/// [`TraceError::NonFiniteCoordinate`]) cannot occur on valid input.
pub fn process(image: &RgbaImage, config: &TraceConfig) -> Result<TraceResult, TraceError> {
    process_with_diagnostics(image, config).map(|(result, _)| result)
}

/// Run the full tracing pipeline, also returning per-stage
/// diagnostics.
///
/// # Errors
///
/// Same as [`process`].
pub fn process_with_diagnostics(
    image: &RgbaImage,
    config: &TraceConfig,
) -> Result<(TraceResult, TraceDiagnostics), TraceError> {
    let fitted = pipeline::Pending::new(image, config.clone())
        .binarize()?
        .trace()?
        .simplify()
        .fit()?;
    Ok(fitted.into_parts())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// White canvas with a black square, the canonical tracing
    /// scenario.
    fn square_image(size: u32, square: u32) -> RgbaImage {
        let offset = (size - square) / 2;
        RgbaImage::from_fn(size, size, |x, y| {
            let inside = x >= offset && x < offset + square && y >= offset && y < offset + square;
            if inside {
                image::Rgba([0, 0, 0, 255])
            } else {
                image::Rgba([255, 255, 255, 255])
            }
        })
    }

    fn config() -> TraceConfig {
        TraceConfig {
            turdsize: 0,
            opttolerance: 0.0,
            ..TraceConfig::default()
        }
    }

    #[test]
    fn square_traces_to_four_line_segments() {
        let result = process(&square_image(100, 50), &config()).unwrap();
        assert_eq!(result.paths.len(), 1);

        let path = &result.paths[0];
        assert_eq!(path.orientation(), Orientation::Outer);
        assert_eq!(path.segments().len(), 4);
        assert!(path
            .segments()
            .iter()
            .all(|s| matches!(s, Segment::Line { .. })));
        assert_eq!(result.dimensions, Dimensions::new(100, 100));
    }

    #[test]
    fn blank_canvas_yields_empty_forest() {
        let image = RgbaImage::from_pixel(32, 32, image::Rgba([255, 255, 255, 255]));
        let result = process(&image, &config()).unwrap();
        assert!(result.paths.is_empty());
        assert!(result.bitmap.is_blank());
    }

    #[test]
    fn square_with_hole_yields_opposite_windings() {
        let mut image = square_image(100, 50);
        // Punch a 20x20 white hole in the middle.
        for y in 40..60 {
            for x in 40..60 {
                image.put_pixel(x, y, image::Rgba([255, 255, 255, 255]));
            }
        }

        let result = process(&image, &config()).unwrap();
        assert_eq!(result.paths.len(), 2);

        let outer = &result.paths[0];
        let hole = &result.paths[1];
        assert_eq!(outer.orientation(), Orientation::Outer);
        assert_eq!(hole.orientation(), Orientation::Hole);
        assert_eq!(hole.parent(), Some(0));
        assert_eq!(hole.depth(), 1);
    }

    #[test]
    fn processing_is_deterministic() {
        let image = square_image(64, 30);
        let first = process(&image, &config()).unwrap();
        let second = process(&image, &config()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn diagnostics_travel_with_the_result() {
        let (result, diagnostics) =
            process_with_diagnostics(&square_image(100, 50), &config()).unwrap();
        assert_eq!(diagnostics.fitting.paths, result.paths.len());
        assert_eq!(diagnostics.preprocess.opaque_pixels, 2500);
    }

    #[test]
    fn speckles_vanish_at_default_turdsize() {
        let mut image = RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]));
        // A 3x3 blot: area 9, far below the default turdsize of 150.
        for y in 10..13 {
            for x in 10..13 {
                image.put_pixel(x, y, image::Rgba([0, 0, 0, 255]));
            }
        }
        let result = process(&image, &TraceConfig::default()).unwrap();
        assert!(result.paths.is_empty());
    }
}
