//! Shared types for the stencil tracing pipeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::contour::ContourTracerKind;
use crate::curve::CurveFitterKind;
use crate::downscale::DownscaleFilter;
use crate::threshold::DitherMode;

/// Re-export `RgbaImage` so downstream crates can reference decoded
/// raster data without depending on `image` directly.
pub use image::RgbaImage;

/// Re-export `GrayImage` for callers working with single-channel data.
pub use image::GrayImage;

/// A point on the pixel-corner lattice.
///
/// Contour vertices live on the corners between pixels, so a `w`×`h`
/// bitmap has lattice coordinates in `0..=w` × `0..=h`. Signed so that
/// neighbour arithmetic during tracing cannot underflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatticePoint {
    /// Horizontal lattice position.
    pub x: i32,
    /// Vertical lattice position.
    pub y: i32,
}

impl LatticePoint {
    /// Create a new lattice point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Convert to a floating-point image-space point.
    #[must_use]
    pub const fn to_point(self) -> Point {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// A 2D point in image coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position (pixels from left edge).
    pub x: f64,
    /// Vertical position (pixels from top edge).
    pub y: f64,
}

impl Point {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance to another point.
    ///
    /// Avoids the square root for comparison purposes.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx.mul_add(dx, dy * dy)
    }

    /// Euclidean distance to another point.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        self.distance_squared(other).sqrt()
    }

    /// Whether both coordinates are finite (no NaN or infinity).
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Dimensions {
    /// Create new dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total pixel count.
    #[must_use]
    pub const fn pixel_count(self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Winding classification of a traced contour.
///
/// Outer boundaries and holes wind in opposite directions, so a
/// nonzero fill rule renders holes as transparent gaps without any
/// explicit subtraction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Orientation {
    /// Boundary of an opaque region.
    Outer,
    /// Boundary of a transparent region nested inside an opaque one.
    Hole,
}

impl Orientation {
    /// The opposite orientation.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Outer => Self::Hole,
            Self::Hole => Self::Outer,
        }
    }
}

/// A closed boundary extracted from a bitmap.
///
/// Vertices are lattice points in order; the last vertex connects back
/// to the first implicitly. Containment metadata (`parent`, `depth`) is
/// assigned once after tracing and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contour {
    points: Vec<LatticePoint>,
    /// Signed shoelace area in pixels² (sign encodes winding).
    area: i64,
    orientation: Orientation,
    /// The pixel whose discovery started this trace; its centre is
    /// strictly interior.
    seed: LatticePoint,
    parent: Option<usize>,
    depth: u32,
}

impl Contour {
    /// Create a contour with containment metadata not yet resolved.
    #[must_use]
    pub(crate) const fn new(
        points: Vec<LatticePoint>,
        area: i64,
        orientation: Orientation,
        seed: LatticePoint,
    ) -> Self {
        Self {
            points,
            area,
            orientation,
            seed,
            parent: None,
            depth: 0,
        }
    }

    /// The closed vertex ring (last vertex connects back to the first).
    #[must_use]
    pub fn points(&self) -> &[LatticePoint] {
        &self.points
    }

    /// Signed shoelace area in pixels².
    #[must_use]
    pub const fn area(&self) -> i64 {
        self.area
    }

    /// Absolute enclosed area in pixels².
    #[must_use]
    pub const fn enclosed_area(&self) -> u64 {
        self.area.unsigned_abs()
    }

    /// Winding classification.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// A point strictly inside this contour (the seed pixel's centre).
    #[must_use]
    pub const fn interior_point(&self) -> Point {
        Point::new(self.seed.x as f64 + 0.5, self.seed.y as f64 + 0.5)
    }

    /// Index of the smallest enclosing contour, if nested.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Nesting level (0 for top-level outer contours).
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }

    pub(crate) const fn set_nesting(&mut self, parent: Option<usize>, depth: u32) {
        self.parent = parent;
        self.depth = depth;
    }
}

/// A simplified closed polygon derived from a [`Contour`].
///
/// Carries one corner flag per vertex: corner vertices must be
/// preserved exactly by downstream curve fitting, smooth vertices may
/// be rounded through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polygon {
    vertices: Vec<Point>,
    corners: Vec<bool>,
    orientation: Orientation,
    parent: Option<usize>,
    depth: u32,
}

impl Polygon {
    /// Create a polygon. `corners` must be parallel to `vertices`.
    #[must_use]
    pub fn new(
        vertices: Vec<Point>,
        corners: Vec<bool>,
        orientation: Orientation,
        parent: Option<usize>,
        depth: u32,
    ) -> Self {
        debug_assert_eq!(vertices.len(), corners.len());
        Self {
            vertices,
            corners,
            orientation,
            parent,
            depth,
        }
    }

    /// The closed vertex ring.
    #[must_use]
    pub fn vertices(&self) -> &[Point] {
        &self.vertices
    }

    /// Per-vertex corner flags, parallel to [`vertices`](Self::vertices).
    #[must_use]
    pub fn corners(&self) -> &[bool] {
        &self.corners
    }

    /// Number of vertices.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the polygon has no vertices.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Winding classification, inherited from the source contour.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Index of the enclosing polygon within the simplified forest.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Nesting level, inherited from the source contour.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }
}

/// One piece of a closed vector path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Straight line to `end`.
    Line {
        /// Segment endpoint.
        end: Point,
    },
    /// Cubic Bézier to `end` with control points `c1` and `c2`.
    Cubic {
        /// First control point.
        c1: Point,
        /// Second control point.
        c2: Point,
        /// Segment endpoint.
        end: Point,
    },
}

impl Segment {
    /// The endpoint of this segment.
    #[must_use]
    pub const fn end(&self) -> Point {
        match *self {
            Self::Line { end } | Self::Cubic { end, .. } => end,
        }
    }

    /// Whether every coordinate in this segment is finite.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        match *self {
            Self::Line { end } => end.is_finite(),
            Self::Cubic { c1, c2, end } => c1.is_finite() && c2.is_finite() && end.is_finite(),
        }
    }
}

/// A closed vector path fitted to a simplified polygon.
///
/// The final segment always ends at [`start`](Self::start); traced
/// regions have no open boundaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurvePath {
    start: Point,
    segments: Vec<Segment>,
    orientation: Orientation,
    parent: Option<usize>,
    depth: u32,
}

impl CurvePath {
    #[must_use]
    pub(crate) const fn new(
        start: Point,
        segments: Vec<Segment>,
        orientation: Orientation,
        parent: Option<usize>,
        depth: u32,
    ) -> Self {
        Self {
            start,
            segments,
            orientation,
            parent,
            depth,
        }
    }

    /// The starting point of the path.
    #[must_use]
    pub const fn start(&self) -> Point {
        self.start
    }

    /// The segment sequence. The last segment ends at [`start`](Self::start).
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Winding classification, inherited from the source polygon.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Index of the enclosing path within the forest.
    #[must_use]
    pub const fn parent(&self) -> Option<usize> {
        self.parent
    }

    /// Nesting level, inherited from the source polygon.
    #[must_use]
    pub const fn depth(&self) -> u32 {
        self.depth
    }
}

/// Configuration for the tracing pipeline.
///
/// All parameters have documented defaults. Fields are plain data so
/// configs round-trip through JSON (CLI `--config-json`, batch
/// manifests).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceConfig {
    /// Luma cutoff: a pixel is opaque iff its luma is below this value
    /// and its alpha is non-zero.
    pub threshold: u8,

    /// Gaussian blur radius (sigma) applied before thresholding.
    /// Zero disables the blur.
    pub blur_radius: f32,

    /// Optional exact target dimensions to resize to before tracing.
    /// Reduces staircasing on oversized inputs.
    pub downscale: Option<Dimensions>,

    /// Resampling filter used when `downscale` is set.
    pub downscale_filter: DownscaleFilter,

    /// Convert to grayscale before blur/downscale instead of after.
    pub grayscale_first: bool,

    /// Dithering applied to luma before the threshold comparison.
    pub dither: DitherMode,

    /// Minimum enclosed area (pixels²) a contour must have to survive
    /// speckle suppression.
    pub turdsize: u32,

    /// Corner smoothness threshold. A vertex is smooth (eligible for
    /// curve rounding) iff its turning angle is below
    /// `alphamax * π/4` radians. Zero forces purely polygonal corners.
    pub alphamax: f64,

    /// Maximum perpendicular deviation (pixels) allowed when replacing
    /// a run of polygon edges with a cubic Bézier. Zero disables curve
    /// substitution entirely.
    pub opttolerance: f64,

    /// Request minified SVG output from the export layer.
    pub minify: bool,

    /// Strict-mode canvas size. When set, inputs whose dimensions do
    /// not match are rejected before any stage runs; `None` skips the
    /// check.
    pub required_size: Option<Dimensions>,

    /// Resource budget: inputs with a side longer than this are
    /// rejected with [`TraceError::CanvasTooLarge`].
    pub max_dimension: u32,

    /// Which contour tracing algorithm to use.
    pub contour_tracer: ContourTracerKind,

    /// Which curve fitting strategy to use.
    pub curve_fitter: CurveFitterKind,
}

impl TraceConfig {
    /// Default luma threshold, matching the original service rule
    /// `luma < 200`.
    pub const DEFAULT_THRESHOLD: u8 = 200;
    /// Default blur radius (disabled).
    pub const DEFAULT_BLUR_RADIUS: f32 = 0.0;
    /// Default speckle suppression area in pixels².
    pub const DEFAULT_TURDSIZE: u32 = 150;
    /// Default corner smoothness threshold.
    pub const DEFAULT_ALPHAMAX: f64 = 1.0;
    /// Default curve fitting tolerance in pixels.
    pub const DEFAULT_OPTTOLERANCE: f64 = 0.2;
    /// Default maximum canvas side length. Sized to accommodate the
    /// 4096×4096 canvases the original service was built around, with
    /// headroom.
    pub const DEFAULT_MAX_DIMENSION: u32 = 8192;
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            threshold: Self::DEFAULT_THRESHOLD,
            blur_radius: Self::DEFAULT_BLUR_RADIUS,
            downscale: None,
            downscale_filter: DownscaleFilter::default(),
            grayscale_first: false,
            dither: DitherMode::default(),
            turdsize: Self::DEFAULT_TURDSIZE,
            alphamax: Self::DEFAULT_ALPHAMAX,
            opttolerance: Self::DEFAULT_OPTTOLERANCE,
            minify: false,
            required_size: None,
            max_dimension: Self::DEFAULT_MAX_DIMENSION,
            contour_tracer: ContourTracerKind::default(),
            curve_fitter: CurveFitterKind::default(),
        }
    }
}

/// Result of a single tracing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceResult {
    /// The fitted path forest, indexed consistently with each path's
    /// `parent` field.
    pub paths: Vec<CurvePath>,

    /// Dimensions of the traced canvas (post-downscale when
    /// `downscale` was set). Export serializers use this to size the
    /// SVG root and `viewBox`.
    pub dimensions: Dimensions,

    /// The binarized bitmap, retained so the caller can render the
    /// black/transparent mask without re-running preprocessing.
    pub bitmap: Bitmap,
}

/// Broad failure classes for batch reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// The input was rejected before any stage ran.
    Input,
    /// An internal invariant was violated mid-pipeline.
    Processing,
    /// The input exceeded a configured resource budget.
    Resource,
}

/// Errors that can occur during tracing.
///
/// Input errors fail a conversion before any pipeline stage runs;
/// processing errors indicate internal invariant violations and must
/// not occur on valid input; resource errors report budget violations.
/// None of them are retried, and a failure affects only the current
/// image.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
pub enum TraceError {
    /// The input canvas has zero width or height.
    #[error("input canvas has zero area")]
    EmptyCanvas,

    /// Strict mode: the canvas does not match the required size.
    #[error("canvas size {actual} does not match required size {expected}")]
    SizeMismatch {
        /// The size demanded by `required_size`.
        expected: Dimensions,
        /// The size actually supplied.
        actual: Dimensions,
    },

    /// The canvas exceeds the configured side-length budget.
    #[error("canvas size {actual} exceeds the maximum side length {max}")]
    CanvasTooLarge {
        /// The size actually supplied.
        actual: Dimensions,
        /// The configured `max_dimension`.
        max: u32,
    },

    /// A boundary walk failed to return to its starting corner.
    #[error("contour starting at pixel ({x}, {y}) failed to close")]
    UnclosedContour {
        /// Seed pixel column.
        x: u32,
        /// Seed pixel row.
        y: u32,
    },

    /// Curve fitting produced a NaN or infinite coordinate.
    #[error("curve fitting produced a non-finite coordinate")]
    NonFiniteCoordinate,

    /// The item landed beyond the per-call batch limit.
    #[error("batch item exceeds the per-call limit of {limit} images")]
    BatchExceeded {
        /// The configured batch limit.
        limit: usize,
    },

    /// A batch worker terminated without reporting a result.
    #[error("batch worker terminated without reporting a result")]
    BatchWorkerLost,
}

impl TraceError {
    /// The broad failure class of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptyCanvas | Self::SizeMismatch { .. } => ErrorKind::Input,
            Self::CanvasTooLarge { .. } | Self::BatchExceeded { .. } => ErrorKind::Resource,
            Self::UnclosedContour { .. } | Self::NonFiniteCoordinate | Self::BatchWorkerLost => {
                ErrorKind::Processing
            }
        }
    }
}
