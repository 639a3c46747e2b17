//! Curve fitting: replacing polygon edge runs with cubic Béziers.
//!
//! Fitting works span by span between corner vertices, which must be
//! preserved exactly. Within a span the fitter grows candidate runs
//! greedily and accepts a cubic only when every original vertex stays
//! within `opttolerance` of it, so the output never drifts from the
//! traced shape by more than the configured bound.

use serde::{Deserialize, Serialize};

use crate::types::{CurvePath, Point, Polygon, Segment, TraceError};

/// A curve fitting strategy.
pub trait CurveFitter {
    /// Fit closed paths to simplified polygons.
    ///
    /// Topology metadata (orientation, parent, depth) passes through
    /// unchanged, index for index.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::NonFiniteCoordinate`] if fitting produces
    /// a NaN or infinite control point. This indicates an internal
    /// invariant violation and cannot occur for polygons produced by
    /// this crate.
    fn fit(&self, polygons: &[Polygon], opttolerance: f64) -> Result<Vec<CurvePath>, TraceError>;
}

/// Selects a curve fitting strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CurveFitterKind {
    /// Cubic Bézier fitting between corner vertices.
    #[default]
    Smooth,
    /// Straight lines only. Faster and exact, at the cost of visible
    /// polygonal edges on organic shapes.
    Polygonal,
}

impl CurveFitterKind {
    /// Instantiate the selected fitter.
    #[must_use]
    pub fn fitter(self) -> Box<dyn CurveFitter> {
        match self {
            Self::Smooth => Box::new(SmoothFitter),
            Self::Polygonal => Box::new(PolygonalFitter),
        }
    }
}

/// Fit all polygons using the selected strategy.
///
/// # Errors
///
/// See [`CurveFitter::fit`].
pub fn fit_curves(
    polygons: &[Polygon],
    kind: CurveFitterKind,
    opttolerance: f64,
) -> Result<Vec<CurvePath>, TraceError> {
    kind.fitter().fit(polygons, opttolerance)
}

/// Emits one line segment per polygon edge.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolygonalFitter;

impl CurveFitter for PolygonalFitter {
    fn fit(&self, polygons: &[Polygon], _opttolerance: f64) -> Result<Vec<CurvePath>, TraceError> {
        polygons.iter().map(polygonal_path).collect()
    }
}

/// Greedy cubic fitting between corner vertices.
#[derive(Debug, Clone, Copy, Default)]
pub struct SmoothFitter;

impl CurveFitter for SmoothFitter {
    fn fit(&self, polygons: &[Polygon], opttolerance: f64) -> Result<Vec<CurvePath>, TraceError> {
        polygons
            .iter()
            .map(|polygon| {
                if opttolerance <= 0.0 || polygon.len() < 3 {
                    return polygonal_path(polygon);
                }
                smooth_path(polygon, opttolerance)
            })
            .collect()
    }
}

fn polygonal_path(polygon: &Polygon) -> Result<CurvePath, TraceError> {
    let vertices = polygon.vertices();
    let segments = vertices
        .iter()
        .cycle()
        .skip(1)
        .take(vertices.len())
        .map(|&end| Segment::Line { end })
        .collect();
    finish_path(polygon, vertices[0], segments)
}

fn smooth_path(polygon: &Polygon, opttolerance: f64) -> Result<CurvePath, TraceError> {
    let vertices = polygon.vertices();
    let n = vertices.len();

    // Spans run between consecutive corner vertices; a ring with no
    // corners gets two artificial anchors so each span is open.
    let mut anchors: Vec<usize> = polygon
        .corners()
        .iter()
        .enumerate()
        .filter_map(|(i, &corner)| corner.then_some(i))
        .collect();
    if anchors.is_empty() {
        anchors = vec![0, n / 2];
    } else if anchors.len() == 1 {
        anchors.push((anchors[0] + n / 2) % n);
        anchors.sort_unstable();
    }

    let start = vertices[anchors[0]];
    let mut segments = Vec::new();
    for (k, &from) in anchors.iter().enumerate() {
        let to = anchors[(k + 1) % anchors.len()];
        // Unwrapped span indices: from..=to going forward around the
        // ring.
        let span_len = (to + n - from) % n;
        let span_len = if span_len == 0 { n } else { span_len };
        let span: Vec<Point> = (0..=span_len).map(|i| vertices[(from + i) % n]).collect();
        fit_span(&span, opttolerance, &mut segments);
    }

    finish_path(polygon, start, segments)
}

/// Fit one open span, growing cubic runs greedily and falling back to
/// single line segments where no cubic stays within tolerance.
fn fit_span(span: &[Point], opttolerance: f64, segments: &mut Vec<Segment>) {
    let mut s = 0;
    while s + 1 < span.len() {
        let mut accepted: Option<(usize, Point, Point)> = None;
        let mut e = s + 2;
        while e < span.len() {
            match try_fit_cubic(&span[s..=e], opttolerance) {
                Some((c1, c2)) => {
                    accepted = Some((e, c1, c2));
                    e += 1;
                }
                None => break,
            }
        }
        if let Some((e, c1, c2)) = accepted {
            segments.push(Segment::Cubic {
                c1,
                c2,
                end: span[e],
            });
            s = e;
        } else {
            segments.push(Segment::Line { end: span[s + 1] });
            s += 1;
        }
    }
}

/// Least-squares cubic through `pts` with endpoint interpolation and
/// chord-length parameters. Returns the control points when every
/// input vertex lies within `opttolerance` of the curve.
fn try_fit_cubic(pts: &[Point], opttolerance: f64) -> Option<(Point, Point)> {
    let n = pts.len();
    debug_assert!(n >= 3);
    let p0 = pts[0];
    let p3 = pts[n - 1];

    let t0 = unit(sub(pts[1], p0))?;
    let t3 = unit(sub(pts[n - 2], p3))?;

    // Normalized chord-length parameterization.
    let mut u = Vec::with_capacity(n);
    let mut acc = 0.0_f64;
    u.push(0.0);
    for i in 1..n {
        acc += pts[i].distance(pts[i - 1]);
        u.push(acc);
    }
    if acc <= f64::EPSILON {
        return None;
    }
    for v in &mut u {
        *v /= acc;
    }

    // Standard least-squares solve for the two tangent magnitudes.
    let (mut c00, mut c01, mut c11) = (0.0_f64, 0.0_f64, 0.0_f64);
    let (mut x0, mut x1) = (0.0_f64, 0.0_f64);
    for (i, &ui) in u.iter().enumerate() {
        let b = bernstein(ui);
        let a1 = scale(t0, b.1);
        let a2 = scale(t3, b.2);
        c00 += dot(a1, a1);
        c01 += dot(a1, a2);
        c11 += dot(a2, a2);
        let base = (
            p0.x.mul_add(b.0 + b.1, p3.x * (b.2 + b.3)),
            p0.y.mul_add(b.0 + b.1, p3.y * (b.2 + b.3)),
        );
        let tmp = (pts[i].x - base.0, pts[i].y - base.1);
        x0 += dot(a1, tmp);
        x1 += dot(a2, tmp);
    }

    let det = c00.mul_add(c11, -(c01 * c01));
    let (mut alpha1, mut alpha2) = if det.abs() > f64::EPSILON {
        ((x0.mul_add(c11, -(c01 * x1))) / det, (c00.mul_add(x1, -(c01 * x0))) / det)
    } else {
        (0.0, 0.0)
    };

    // Degenerate or wrong-way tangents: fall back to the one-third
    // chord heuristic.
    let chord = p0.distance(p3);
    if !alpha1.is_finite() || !alpha2.is_finite() || alpha1 <= 0.0 || alpha2 <= 0.0 {
        alpha1 = chord / 3.0;
        alpha2 = chord / 3.0;
    }

    let c1 = Point::new(t0.0.mul_add(alpha1, p0.x), t0.1.mul_add(alpha1, p0.y));
    let c2 = Point::new(t3.0.mul_add(alpha2, p3.x), t3.1.mul_add(alpha2, p3.y));
    if !c1.is_finite() || !c2.is_finite() {
        return None;
    }

    // Accept only when every original vertex stays within tolerance.
    let within = u
        .iter()
        .zip(pts)
        .all(|(&ui, &p)| cubic_point(p0, c1, c2, p3, ui).distance(p) <= opttolerance);
    within.then_some((c1, c2))
}

/// Evaluate a cubic Bézier at parameter `t`.
pub(crate) fn cubic_point(p0: Point, c1: Point, c2: Point, p3: Point, t: f64) -> Point {
    let b = bernstein(t);
    Point::new(
        p0.x.mul_add(b.0, c1.x.mul_add(b.1, c2.x.mul_add(b.2, p3.x * b.3))),
        p0.y.mul_add(b.0, c1.y.mul_add(b.1, c2.y.mul_add(b.2, p3.y * b.3))),
    )
}

const fn bernstein(t: f64) -> (f64, f64, f64, f64) {
    let s = 1.0 - t;
    (
        s * s * s,
        3.0 * s * s * t,
        3.0 * s * t * t,
        t * t * t,
    )
}

const fn sub(a: Point, b: Point) -> (f64, f64) {
    (a.x - b.x, a.y - b.y)
}

const fn scale(v: (f64, f64), k: f64) -> (f64, f64) {
    (v.0 * k, v.1 * k)
}

fn dot(a: (f64, f64), b: (f64, f64)) -> f64 {
    a.0.mul_add(b.0, a.1 * b.1)
}

fn unit(v: (f64, f64)) -> Option<(f64, f64)> {
    let len = dot(v, v).sqrt();
    if len <= f64::EPSILON {
        return None;
    }
    Some((v.0 / len, v.1 / len))
}

/// Validate finiteness and assemble the closed path.
fn finish_path(
    polygon: &Polygon,
    start: Point,
    segments: Vec<Segment>,
) -> Result<CurvePath, TraceError> {
    if !start.is_finite() || segments.iter().any(|s| !s.is_finite()) {
        return Err(TraceError::NonFiniteCoordinate);
    }
    Ok(CurvePath::new(
        start,
        segments,
        polygon.orientation(),
        polygon.parent(),
        polygon.depth(),
    ))
}
