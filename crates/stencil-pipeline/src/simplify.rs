//! Polygon simplification: speckle pruning, staircase collapse and
//! corner classification.
//!
//! Contour tracing emits one vertex per lattice corner, so a straight
//! 50-pixel edge arrives as 50 collinear vertices and a shallow
//! diagonal as a staircase. A Ramer-Douglas-Peucker pass with a fixed
//! sub-pixel tolerance collapses both without disturbing real
//! features. Simplification only ever removes vertices; topology,
//! orientation and nesting pass through untouched.

use std::f64::consts::FRAC_PI_4;

use crate::types::{Contour, Point, Polygon};

/// RDP tolerance in pixels. Just over half a pixel diagonal, so
/// single-pixel staircase steps collapse while genuine one-pixel
/// features survive.
const STAIRCASE_TOLERANCE: f64 = 0.75;

/// Simplify traced contours into polygons.
///
/// Contours whose enclosed area is below `turdsize` are dropped as
/// speckles (along with anything nested inside them). Each survivor is
/// simplified and its vertices classified as smooth or corner: a
/// vertex is smooth iff its turning angle is below `alphamax * π/4`
/// radians, so `alphamax = 0` marks every vertex a corner and yields
/// purely polygonal output downstream.
#[must_use]
pub fn simplify_contours(contours: &[Contour], turdsize: u32, alphamax: f64) -> Vec<Polygon> {
    // Map surviving contour indices to their position in the output so
    // parent references stay valid. Parents always precede children,
    // so a pruned ancestor prunes the whole subtree in one pass.
    let mut remap: Vec<Option<usize>> = vec![None; contours.len()];
    let mut polygons = Vec::new();

    for (i, contour) in contours.iter().enumerate() {
        if contour.enclosed_area() < u64::from(turdsize) {
            continue;
        }
        let parent = match contour.parent() {
            Some(p) => match remap[p] {
                Some(mapped) => Some(mapped),
                // Enclosing contour was pruned; this one goes too.
                None => continue,
            },
            None => None,
        };

        let vertices = simplify_ring(contour.points().iter().map(|p| p.to_point()).collect());
        let corners = classify_corners(&vertices, alphamax);
        remap[i] = Some(polygons.len());
        polygons.push(Polygon::new(
            vertices,
            corners,
            contour.orientation(),
            parent,
            contour.depth(),
        ));
    }

    polygons
}

/// RDP over a closed ring.
///
/// The open-polyline algorithm needs fixed endpoints, so the ring is
/// split at two mutually distant anchors (the first vertex and the
/// vertex farthest from it) and each half simplified independently.
fn simplify_ring(points: Vec<Point>) -> Vec<Point> {
    let n = points.len();
    // A unit square (four vertices) is already minimal; simplifying it
    // further would collapse the ring into a degenerate sliver.
    if n <= 4 {
        return points;
    }

    let far = points
        .iter()
        .enumerate()
        .skip(1)
        .max_by(|(_, a), (_, b)| {
            points[0]
                .distance_squared(**a)
                .total_cmp(&points[0].distance_squared(**b))
        })
        .map_or(n / 2, |(i, _)| i);

    let mut kept = vec![false; n];
    kept[0] = true;
    kept[far] = true;
    rdp_mark(&points, 0, far, &mut kept);
    // Second half wraps: index n stands for vertex 0 again.
    rdp_mark(&points, far, n, &mut kept);

    points
        .into_iter()
        .zip(kept)
        .filter_map(|(p, keep)| keep.then_some(p))
        .collect()
}

/// Mark vertices to keep between `first` and `last` (exclusive of the
/// endpoints, which are already kept). Indices are modular so the
/// second half of a ring can wrap past the end.
fn rdp_mark(points: &[Point], first: usize, last: usize, kept: &mut [bool]) {
    if last <= first + 1 {
        return;
    }
    let n = points.len();
    let a = points[first % n];
    let b = points[last % n];

    let mut max_distance = 0.0_f64;
    let mut max_index = first;
    for i in first + 1..last {
        let d = perpendicular_distance(points[i % n], a, b);
        if d > max_distance {
            max_distance = d;
            max_index = i;
        }
    }

    if max_distance > STAIRCASE_TOLERANCE {
        kept[max_index % n] = true;
        rdp_mark(points, first, max_index, kept);
        rdp_mark(points, max_index, last, kept);
    }
}

/// Distance from `p` to the line through `a` and `b` (to the point `a`
/// when the chord is degenerate).
fn perpendicular_distance(p: Point, a: Point, b: Point) -> f64 {
    let chord_sq = a.distance_squared(b);
    if chord_sq <= f64::EPSILON {
        return p.distance(a);
    }
    let cross = (b.x - a.x).mul_add(p.y - a.y, -((b.y - a.y) * (p.x - a.x)));
    cross.abs() / chord_sq.sqrt()
}

/// Classify each ring vertex as corner (`true`) or smooth (`false`)
/// from the turning angle between its incoming and outgoing edges.
fn classify_corners(vertices: &[Point], alphamax: f64) -> Vec<bool> {
    let n = vertices.len();
    if n < 3 {
        return vec![true; n];
    }
    let bound = alphamax * FRAC_PI_4;
    (0..n)
        .map(|i| {
            let prev = vertices[(i + n - 1) % n];
            let here = vertices[i];
            let next = vertices[(i + 1) % n];
            turning_angle(prev, here, next) >= bound
        })
        .collect()
}

/// Absolute turning angle at `here`, in radians: 0 for collinear
/// edges, π for a full reversal.
fn turning_angle(prev: Point, here: Point, next: Point) -> f64 {
    let (ix, iy) = (here.x - prev.x, here.y - prev.y);
    let (ox, oy) = (next.x - here.x, next.y - here.y);
    let dot = ix.mul_add(ox, iy * oy);
    let norms = (ix.mul_add(ix, iy * iy) * ox.mul_add(ox, oy * oy)).sqrt();
    if norms <= f64::EPSILON {
        return 0.0;
    }
    (dot / norms).clamp(-1.0, 1.0).acos()
}
