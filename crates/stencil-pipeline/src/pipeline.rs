//! Incremental pipeline: advance stage-by-stage, inspecting each
//! intermediate result before continuing.
//!
//! Unlike [`crate::process`] which runs every stage in one call,
//! [`Pending`] lets the caller drive execution one step at a time:
//!
//! ```rust
//! # use stencil_pipeline::pipeline::Pending;
//! # use stencil_pipeline::{TraceConfig, TraceError};
//! # fn run(image: &stencil_pipeline::RgbaImage) -> Result<(), TraceError> {
//! let config = TraceConfig::default();
//! let fitted = Pending::new(image, config)
//!     .binarize()?
//!     .trace()?
//!     .simplify()
//!     .fit()?;
//!
//! let (result, diagnostics) = fitted.into_parts();
//! # Ok(())
//! # }
//! ```
//!
//! Each stage method consumes `self` and returns the next pipeline
//! state (or `Result` for fallible stages), carrying the computed
//! intermediates. The caller can inspect the current stage's output
//! via accessor methods at any point.

use crate::bitmap::Bitmap;
use crate::diagnostics::{
    FittingCounts, PreprocessCounts, SimplificationCounts, TraceDiagnostics, TracingCounts,
};
use crate::types::{
    Contour, CurvePath, Orientation, Polygon, RgbaImage, Segment, TraceConfig, TraceError,
    TraceResult,
};

// ───────────────────────── Stage 0: Pending ──────────────────────────

/// Pipeline state before any processing has occurred.
///
/// The source image is borrowed, not copied; only the binarized bitmap
/// survives past the first stage. Call [`binarize`](Self::binarize) to
/// advance.
#[must_use = "pipeline stages are consumed by advancing: call .binarize() to continue"]
pub struct Pending<'a> {
    config: TraceConfig,
    image: &'a RgbaImage,
}

impl<'a> Pending<'a> {
    /// Start a pipeline over a decoded image.
    pub const fn new(image: &'a RgbaImage, config: TraceConfig) -> Self {
        Self { config, image }
    }

    /// The pipeline configuration.
    #[must_use]
    pub const fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Validate the canvas, run preprocessing (grayscale, blur,
    /// downscale) and threshold into a bitmap.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::EmptyCanvas`] for a zero-area canvas,
    /// [`TraceError::SizeMismatch`] when `required_size` is set and
    /// does not match, and [`TraceError::CanvasTooLarge`] when a side
    /// exceeds `max_dimension`.
    pub fn binarize(self) -> Result<Binarized, TraceError> {
        let dimensions = crate::types::Dimensions::new(self.image.width(), self.image.height());
        if dimensions.pixel_count() == 0 {
            return Err(TraceError::EmptyCanvas);
        }
        if let Some(expected) = self.config.required_size {
            if dimensions != expected {
                return Err(TraceError::SizeMismatch {
                    expected,
                    actual: dimensions,
                });
            }
        }
        if dimensions.width > self.config.max_dimension
            || dimensions.height > self.config.max_dimension
        {
            return Err(TraceError::CanvasTooLarge {
                actual: dimensions,
                max: self.config.max_dimension,
            });
        }

        let mut current = std::borrow::Cow::Borrowed(self.image);
        if self.config.grayscale_first {
            current = std::borrow::Cow::Owned(crate::threshold::grayscale_rgba(&current));
        }
        if self.config.blur_radius > 0.0 {
            current = std::borrow::Cow::Owned(crate::blur::gaussian_blur_rgba(
                &current,
                self.config.blur_radius,
            ));
        }
        if let Some(target) = self.config.downscale {
            current = std::borrow::Cow::Owned(crate::downscale::downscale(
                &current,
                target,
                self.config.downscale_filter,
            ));
        }

        let bitmap =
            crate::threshold::binarize(&current, self.config.threshold, self.config.dither);
        Ok(Binarized {
            config: self.config,
            bitmap,
        })
    }
}

// ───────────────────────── Stage 1: Binarized ────────────────────────

/// Pipeline state after thresholding into a bitmap.
///
/// Call [`trace`](Self::trace) to advance.
#[must_use = "pipeline stages are consumed by advancing: call .trace() to continue"]
#[derive(Debug)]
pub struct Binarized {
    config: TraceConfig,
    bitmap: Bitmap,
}

impl Binarized {
    /// The binarized bitmap.
    #[must_use]
    pub const fn bitmap(&self) -> &Bitmap {
        &self.bitmap
    }

    /// Extract contours and advance.
    ///
    /// # Errors
    ///
    /// See [`crate::contour::ContourTracer::trace`].
    pub fn trace(self) -> Result<Traced, TraceError> {
        let contours = crate::contour::trace_contours(&self.bitmap, self.config.contour_tracer)?;
        Ok(Traced {
            config: self.config,
            bitmap: self.bitmap,
            contours,
        })
    }
}

// ───────────────────────── Stage 2: Traced ───────────────────────────

/// Pipeline state after contour extraction.
///
/// Call [`simplify`](Self::simplify) to advance.
#[must_use = "pipeline stages are consumed by advancing: call .simplify() to continue"]
pub struct Traced {
    config: TraceConfig,
    bitmap: Bitmap,
    contours: Vec<Contour>,
}

impl Traced {
    /// The traced contour forest.
    #[must_use]
    pub fn contours(&self) -> &[Contour] {
        &self.contours
    }

    /// Prune speckles, simplify rings, classify corners, and advance.
    pub fn simplify(self) -> Simplified {
        let polygons = crate::simplify::simplify_contours(
            &self.contours,
            self.config.turdsize,
            self.config.alphamax,
        );
        Simplified {
            config: self.config,
            bitmap: self.bitmap,
            contours: self.contours,
            polygons,
        }
    }
}

// ───────────────────────── Stage 3: Simplified ───────────────────────

/// Pipeline state after simplification and corner classification.
///
/// Call [`fit`](Self::fit) to advance.
#[must_use = "pipeline stages are consumed by advancing: call .fit() to continue"]
pub struct Simplified {
    config: TraceConfig,
    bitmap: Bitmap,
    contours: Vec<Contour>,
    polygons: Vec<Polygon>,
}

impl Simplified {
    /// The simplified polygon forest.
    #[must_use]
    pub fn polygons(&self) -> &[Polygon] {
        &self.polygons
    }

    /// Fit curves and finish the pipeline.
    ///
    /// # Errors
    ///
    /// See [`crate::curve::CurveFitter::fit`].
    pub fn fit(self) -> Result<Fitted, TraceError> {
        let paths = crate::curve::fit_curves(
            &self.polygons,
            self.config.curve_fitter,
            self.config.opttolerance,
        )?;

        let diagnostics = TraceDiagnostics {
            preprocess: PreprocessCounts {
                canvas: self.bitmap.dimensions(),
                opaque_pixels: self.bitmap.count_opaque(),
            },
            tracing: TracingCounts {
                contours: self.contours.len(),
                holes: self
                    .contours
                    .iter()
                    .filter(|c| c.orientation() == Orientation::Hole)
                    .count(),
                vertices: self.contours.iter().map(|c| c.points().len()).sum(),
            },
            simplification: SimplificationCounts {
                polygons: self.polygons.len(),
                speckles_dropped: self.contours.len() - self.polygons.len(),
                vertices: self.polygons.iter().map(Polygon::len).sum(),
            },
            fitting: FittingCounts {
                paths: paths.len(),
                line_segments: count_segments(&paths, false),
                curve_segments: count_segments(&paths, true),
            },
        };

        Ok(Fitted {
            result: TraceResult {
                paths,
                dimensions: self.bitmap.dimensions(),
                bitmap: self.bitmap,
            },
            diagnostics,
        })
    }
}

fn count_segments(paths: &[CurvePath], cubic: bool) -> usize {
    paths
        .iter()
        .flat_map(CurvePath::segments)
        .filter(|s| matches!(s, Segment::Cubic { .. }) == cubic)
        .count()
}

// ───────────────────────── Stage 4: Fitted ───────────────────────────

/// Terminal pipeline state: the fitted path forest plus diagnostics.
#[must_use = "call .into_parts() to take the result"]
pub struct Fitted {
    result: TraceResult,
    diagnostics: TraceDiagnostics,
}

impl Fitted {
    /// The trace result.
    #[must_use]
    pub const fn result(&self) -> &TraceResult {
        &self.result
    }

    /// The collected diagnostics.
    #[must_use]
    pub const fn diagnostics(&self) -> &TraceDiagnostics {
        &self.diagnostics
    }

    /// Consume the pipeline, yielding the result and diagnostics.
    #[must_use]
    pub fn into_parts(self) -> (TraceResult, TraceDiagnostics) {
        (self.result, self.diagnostics)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Dimensions;

    fn black_square_image(size: u32, square: u32) -> RgbaImage {
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
    fn stages_expose_intermediates() {
        let image = black_square_image(100, 50);
        let binarized = Pending::new(&image, config()).binarize().unwrap();
        assert_eq!(binarized.bitmap().count_opaque(), 2500);

        let traced = binarized.trace().unwrap();
        assert_eq!(traced.contours().len(), 1);

        let simplified = traced.simplify();
        assert_eq!(simplified.polygons().len(), 1);
        assert_eq!(simplified.polygons()[0].len(), 4);

        let fitted = simplified.fit().unwrap();
        assert_eq!(fitted.result().paths.len(), 1);
        assert_eq!(fitted.result().paths[0].segments().len(), 4);
    }

    #[test]
    fn diagnostics_count_each_stage() {
        let image = black_square_image(100, 50);
        let fitted = Pending::new(&image, config())
            .binarize()
            .unwrap()
            .trace()
            .unwrap()
            .simplify()
            .fit()
            .unwrap();

        let (result, diagnostics) = fitted.into_parts();
        assert_eq!(result.dimensions, Dimensions::new(100, 100));
        assert_eq!(diagnostics.preprocess.opaque_pixels, 2500);
        assert_eq!(diagnostics.tracing.contours, 1);
        assert_eq!(diagnostics.tracing.holes, 0);
        assert_eq!(diagnostics.simplification.polygons, 1);
        assert_eq!(diagnostics.simplification.vertices, 4);
        assert_eq!(diagnostics.fitting.line_segments, 4);
        assert_eq!(diagnostics.fitting.curve_segments, 0);
    }

    #[test]
    fn empty_canvas_is_rejected() {
        let image = RgbaImage::new(0, 10);
        let err = Pending::new(&image, config()).binarize().unwrap_err();
        assert_eq!(err, TraceError::EmptyCanvas);
    }

    #[test]
    fn required_size_is_strict() {
        let image = black_square_image(100, 50);
        let strict = TraceConfig {
            required_size: Some(Dimensions::new(4096, 4096)),
            ..config()
        };
        let err = Pending::new(&image, strict).binarize().unwrap_err();
        assert_eq!(
            err,
            TraceError::SizeMismatch {
                expected: Dimensions::new(4096, 4096),
                actual: Dimensions::new(100, 100),
            },
        );
    }

    #[test]
    fn oversized_canvas_is_rejected() {
        let image = RgbaImage::new(100, 10);
        let tight = TraceConfig {
            max_dimension: 64,
            ..config()
        };
        let err = Pending::new(&image, tight).binarize().unwrap_err();
        assert!(matches!(err, TraceError::CanvasTooLarge { max: 64, .. }));
    }

    #[test]
    fn downscale_changes_traced_dimensions() {
        let image = black_square_image(100, 50);
        let scaled = TraceConfig {
            downscale: Some(Dimensions::new(50, 50)),
            ..config()
        };
        let fitted = Pending::new(&image, scaled)
            .binarize()
            .unwrap()
            .trace()
            .unwrap()
            .simplify()
            .fit()
            .unwrap();
        assert_eq!(fitted.result().dimensions, Dimensions::new(50, 50));
    }
}
