//! Pipeline diagnostics: per-stage counts for tuning and parameter
//! experimentation.
//!
//! These are permanent instrumentation, not debug scaffolding. The
//! engine itself is deterministic and does no I/O, so no timing is
//! collected here; callers that care about wall clock (the CLI does)
//! measure around the pipeline.

use serde::{Deserialize, Serialize};

use crate::types::Dimensions;

/// Diagnostics collected from a single tracing run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceDiagnostics {
    /// Binarization counts.
    pub preprocess: PreprocessCounts,
    /// Contour extraction counts.
    pub tracing: TracingCounts,
    /// Simplification counts.
    pub simplification: SimplificationCounts,
    /// Curve fitting counts.
    pub fitting: FittingCounts,
}

/// Counts from the binarization stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreprocessCounts {
    /// Dimensions of the traced canvas (post-downscale).
    pub canvas: Dimensions,
    /// Opaque pixels after thresholding.
    pub opaque_pixels: u64,
}

/// Counts from the contour extraction stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TracingCounts {
    /// Total contours traced (outers plus holes).
    pub contours: usize,
    /// How many of them are holes.
    pub holes: usize,
    /// Total lattice vertices across all contours.
    pub vertices: usize,
}

/// Counts from the simplification stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimplificationCounts {
    /// Polygons surviving speckle suppression.
    pub polygons: usize,
    /// Contours dropped as speckles (including pruned descendants).
    pub speckles_dropped: usize,
    /// Total vertices after simplification.
    pub vertices: usize,
}

/// Counts from the curve fitting stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FittingCounts {
    /// Fitted closed paths.
    pub paths: usize,
    /// Straight line segments emitted.
    pub line_segments: usize,
    /// Cubic Bézier segments emitted.
    pub curve_segments: usize,
}

impl TraceDiagnostics {
    /// Human-readable multi-line summary.
    #[must_use]
    pub fn report(&self) -> String {
        let Self {
            preprocess,
            tracing,
            simplification,
            fitting,
        } = self;
        format!(
            "canvas: {} ({} opaque px)\n\
             contours: {} ({} holes, {} vertices)\n\
             simplified: {} polygons ({} speckles dropped, {} vertices)\n\
             fitted: {} paths ({} lines, {} curves)",
            preprocess.canvas,
            preprocess.opaque_pixels,
            tracing.contours,
            tracing.holes,
            tracing.vertices,
            simplification.polygons,
            simplification.speckles_dropped,
            simplification.vertices,
            fitting.paths,
            fitting.line_segments,
            fitting.curve_segments,
        )
    }
}
