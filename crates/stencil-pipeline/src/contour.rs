//! Contour extraction from a binary bitmap.
//!
//! Boundaries are walked on the pixel-corner lattice: a `w`×`h` bitmap
//! has corners `0..=w` × `0..=h`, and pixel `(x, y)` occupies the unit
//! square between corners `(x, y)` and `(x+1, y+1)`. Walking corner to
//! corner yields boundaries that lie exactly between opaque and
//! transparent pixels, so closure is guaranteed by construction rather
//! than by floating-point luck.
//!
//! Traced regions are removed from a working copy of the bitmap by
//! flipping every pixel inside the new boundary. This XOR decomposition
//! turns each hole into a fresh opaque region (and each island inside a
//! hole back again), so a single raster rescan discovers every nesting
//! level exactly once. The decomposition also resolves nesting for
//! free: the contour that most recently flipped a pixel is the smallest
//! traced boundary enclosing it, so a new seed's recorded owner is its
//! immediate parent. No pairwise containment tests are needed, keeping
//! tracing linear in pixel count even for dithered inputs that produce
//! one contour per Bayer cell.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::bitmap::Bitmap;
use crate::types::{Contour, LatticePoint, Orientation, TraceError};

/// A contour extraction algorithm.
///
/// Implementations must produce closed boundaries with correct
/// orientation and nesting metadata; see [`Contour`].
pub trait ContourTracer {
    /// Extract all contours from `bitmap`.
    ///
    /// A blank bitmap yields an empty forest, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`TraceError::UnclosedContour`] if a boundary walk fails
    /// to return to its starting corner. This indicates an internal
    /// invariant violation and cannot occur for bitmaps produced by
    /// this crate.
    fn trace(&self, bitmap: &Bitmap) -> Result<Vec<Contour>, TraceError>;
}

/// Selects a contour extraction algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContourTracerKind {
    /// Edge-following walk on the pixel-corner lattice.
    #[default]
    EdgeFollowing,
}

impl ContourTracerKind {
    /// Instantiate the selected tracer.
    #[must_use]
    pub fn tracer(self) -> Box<dyn ContourTracer> {
        match self {
            Self::EdgeFollowing => Box::new(EdgeFollowingTracer),
        }
    }
}

/// Trace all contours using the selected algorithm.
///
/// # Errors
///
/// See [`ContourTracer::trace`].
pub fn trace_contours(bitmap: &Bitmap, kind: ContourTracerKind) -> Result<Vec<Contour>, TraceError> {
    kind.tracer().trace(bitmap)
}

/// Edge-following tracer: walks each boundary keeping the opaque
/// region on its left.
#[derive(Debug, Clone, Copy, Default)]
pub struct EdgeFollowingTracer;

/// Sentinel for pixels not yet inside any traced boundary.
const NO_OWNER: usize = usize::MAX;

impl ContourTracer for EdgeFollowingTracer {
    fn trace(&self, bitmap: &Bitmap) -> Result<Vec<Contour>, TraceError> {
        let mut work = bitmap.clone();
        let mut contours: Vec<Contour> = Vec::new();

        // Per-pixel index of the most recently flipped contour. That
        // contour is the smallest traced boundary enclosing the pixel,
        // so looking up a seed here yields its immediate parent.
        let width = bitmap.width() as usize;
        let mut owner = vec![NO_OWNER; width * bitmap.height() as usize];

        while let Some((seed_x, seed_y)) = work.first_opaque() {
            let ring = follow_boundary(&work, seed_x, seed_y)?;

            let parent = match owner[seed_y as usize * width + seed_x as usize] {
                NO_OWNER => None,
                p => Some(p),
            };
            let depth = parent.map_or(0, |p| contours[p].depth() + 1);

            xor_fill(&mut work, &ring, &mut owner, contours.len());

            // The seed pixel's state in the ORIGINAL bitmap decides
            // whether this boundary encloses ink or a gap: the XOR
            // decomposition flips hole interiors to opaque in the
            // working copy, but never touches the source.
            #[allow(clippy::cast_possible_wrap)]
            let orientation = if bitmap.get(seed_x as i32, seed_y as i32) {
                Orientation::Outer
            } else {
                Orientation::Hole
            };

            let mut points = ring;
            if orientation == Orientation::Hole {
                // Reverse traversal so holes wind opposite to outers
                // (keeps the first vertex first).
                points[1..].reverse();
            }
            let area = signed_area(&points);

            #[allow(clippy::cast_possible_wrap)]
            let seed = LatticePoint::new(seed_x as i32, seed_y as i32);
            let mut contour = Contour::new(points, area, orientation, seed);
            contour.set_nesting(parent, depth);
            contours.push(contour);
        }

        Ok(contours)
    }
}

/// Walk one boundary starting at the top-left corner of `(seed_x,
/// seed_y)`, which must be the first opaque pixel of its region in
/// raster order (so the corner above-left has no opaque neighbours and
/// the initial downward direction keeps the region on the left).
fn follow_boundary(work: &Bitmap, seed_x: u32, seed_y: u32) -> Result<Vec<LatticePoint>, TraceError> {
    #[allow(clippy::cast_possible_wrap)]
    let start = LatticePoint::new(seed_x as i32, seed_y as i32);
    let (mut x, mut y) = (start.x, start.y);
    // Down: the edge from the seed corner along the pixel's left side.
    let (mut dx, mut dy) = (0_i32, 1_i32);

    // Every lattice edge can be walked at most once in each direction.
    let max_steps = 4 * (work.width() as usize + 1) * (work.height() as usize + 1);

    let mut points = Vec::new();
    loop {
        points.push(LatticePoint::new(x, y));
        if points.len() > max_steps {
            return Err(TraceError::UnclosedContour {
                x: seed_x,
                y: seed_y,
            });
        }

        x += dx;
        y += dy;
        if x == start.x && y == start.y {
            break;
        }

        // The two pixels flanking the corner ahead of the walk. The
        // offsets are exact: each numerator is -2 or 0.
        let left = work.get(x + (dx + dy - 1) / 2, y + (dy - dx - 1) / 2);
        let right = work.get(x + (dx - dy - 1) / 2, y + (dy + dx - 1) / 2);

        match (left, right) {
            // Boundary continues straight ahead.
            (true, false) => {}
            // Region bulges across the path: turn right.
            (true, true) => {
                let t = dx;
                dx = -dy;
                dy = t;
            }
            // Region falls away, or checkerboard corner (only the
            // diagonals opaque). Both turn left: the checkerboard
            // tie-break treats the region as 4-connected, so the two
            // diagonal pixels belong to separate boundaries.
            (false, false) | (false, true) => {
                let t = dx;
                dx = dy;
                dy = -t;
            }
        }
    }

    Ok(points)
}

/// Flip every pixel enclosed by `ring` in the working bitmap and
/// record `index` as the pixel's owning contour.
///
/// For each pixel row, the ring's vertical edges crossing that row come
/// in pairs; pixels between consecutive pair members are interior.
fn xor_fill(work: &mut Bitmap, ring: &[LatticePoint], owner: &mut [usize], index: usize) {
    let mut rows: BTreeMap<i32, Vec<i32>> = BTreeMap::new();
    for (i, &a) in ring.iter().enumerate() {
        let b = ring[(i + 1) % ring.len()];
        if a.x == b.x {
            rows.entry(a.y.min(b.y)).or_default().push(a.x);
        }
    }

    let width = work.width() as usize;
    for (row, mut xs) in rows {
        xs.sort_unstable();
        for pair in xs.chunks_exact(2) {
            for x in pair[0]..pair[1] {
                #[allow(clippy::cast_sign_loss)]
                work.flip(x as u32, row as u32);
                #[allow(clippy::cast_sign_loss)]
                let pixel = row as usize * width + x as usize;
                owner[pixel] = index;
            }
        }
    }
}

/// Signed shoelace area of a closed lattice ring, in pixels².
///
/// With y growing downward, outer contours (region on the walk's left)
/// come out negative and reversed holes positive.
fn signed_area(points: &[LatticePoint]) -> i64 {
    let mut doubled = 0_i64;
    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        doubled += i64::from(a.x) * i64::from(b.y) - i64::from(b.x) * i64::from(a.y);
    }
    doubled / 2
}
