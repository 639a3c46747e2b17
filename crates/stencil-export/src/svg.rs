//! SVG export serializer.
//!
//! Converts fitted path forests into an SVG string using the [`svg`]
//! crate for document construction, XML escaping, and path data
//! formatting.
//!
//! Each containment tree (an outer path together with all the holes
//! and islands nested under it) becomes a single `<path>` element
//! whose `d` attribute carries one `Z`-closed subpath per member.
//! Holes wind opposite to outers, so `fill-rule="nonzero"` renders
//! them as transparent gaps without any explicit subtraction.
//!
//! This is a pure function with no I/O -- it returns a `String`.

use svg::Document;
use svg::node::element::path::Data;
use svg::node::element::{Description, Element, Path, Title};
use svg::node::{Node, Text, Value};

use stencil_pipeline::{CurvePath, Dimensions, Segment};

use crate::minify::minify_svg;

/// Options controlling SVG serialization.
///
/// Metadata fields are optional. When present, a `<title>` / `<desc>`
/// element is emitted immediately after the opening `<svg>` tag; these
/// are standard SVG accessibility elements and are surfaced by some
/// file managers and screen readers. Text values are XML-escaped
/// automatically by the `svg` crate.
#[derive(Debug, Clone, Default)]
pub struct SvgOptions<'a> {
    /// Run the minification post-pass on the serialized document.
    pub minify: bool,

    /// Document title, emitted as `<title>`.
    ///
    /// Typically the source image filename (without extension).
    pub title: Option<&'a str>,

    /// Document description, emitted as `<desc>`.
    pub description: Option<&'a str>,

    /// Structured trace configuration JSON, emitted inside a
    /// `<metadata>` element wrapped in a namespaced `<stencil:trace>`
    /// element, so exported files carry machine-parseable settings for
    /// reproducibility.
    pub config_json: Option<&'a str>,
}

/// Errors that can occur during serialization.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    /// A path contains a NaN or infinite coordinate.
    #[error("path {path} contains a non-finite coordinate")]
    NonFiniteCoordinate {
        /// Index of the offending path within the forest.
        path: usize,
    },
}

/// Build an SVG path `d` attribute string for one containment tree.
///
/// Each member path becomes one subpath: `M` to its start, `L`/`C`
/// per segment, then `Z`. Coordinates are formatted by the [`svg`]
/// crate.
///
/// # Examples
///
/// ```
/// use stencil_pipeline::{CurvePath, Point, Polygon, Orientation};
/// use stencil_pipeline::curve::{CurveFitterKind, fit_curves};
/// use stencil_export::build_path_data;
///
/// let polygon = Polygon::new(
///     vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(4.0, 4.0)],
///     vec![true; 3],
///     Orientation::Outer,
///     None,
///     0,
/// );
/// let paths = fit_curves(&[polygon], CurveFitterKind::Polygonal, 0.0).unwrap();
/// let members: Vec<&CurvePath> = paths.iter().collect();
/// assert_eq!(build_path_data(&members), "M0,0 L4,0 L4,4 L0,0 z");
/// ```
#[must_use]
pub fn build_path_data(members: &[&CurvePath]) -> String {
    let mut data = Data::new();
    for path in members {
        let start = path.start();
        data = data.move_to((start.x, start.y));
        for segment in path.segments() {
            data = match *segment {
                Segment::Line { end } => data.line_to((end.x, end.y)),
                Segment::Cubic { c1, c2, end } => {
                    data.cubic_curve_to((c1.x, c1.y, c2.x, c2.y, end.x, end.y))
                }
            };
        }
        data = data.close();
    }
    String::from(Value::from(data))
}

/// Serialize a path forest into an SVG document string.
///
/// The document root is sized to the canvas with a matching `viewBox`.
/// One `<path>` element is emitted per containment tree, filled black
/// with `fill-rule="nonzero"`. An empty forest yields a valid SVG with
/// no `<path>` elements.
///
/// # Errors
///
/// Returns [`ExportError::NonFiniteCoordinate`] if any path carries a
/// NaN or infinite coordinate; no partial document is produced.
pub fn to_svg(
    paths: &[CurvePath],
    dimensions: Dimensions,
    options: &SvgOptions<'_>,
) -> Result<String, ExportError> {
    for (i, path) in paths.iter().enumerate() {
        let finite = path.start().is_finite() && path.segments().iter().all(Segment::is_finite);
        if !finite {
            return Err(ExportError::NonFiniteCoordinate { path: i });
        }
    }

    let (w, h) = (dimensions.width, dimensions.height);
    let mut doc = Document::new()
        .set("width", w)
        .set("height", h)
        .set("viewBox", (0, 0, w, h));

    if let Some(title) = options.title {
        doc = doc.add(Title::new(title));
    }
    if let Some(description) = options.description {
        doc = doc.add(Description::new().add(Text::new(description)));
    }
    if let Some(config_json) = options.config_json {
        let mut trace_el = Element::new("stencil:trace");
        trace_el.assign("xmlns:stencil", "https://stencil-rs.dev/ns/1");
        trace_el.append(Text::new(config_json));
        let mut metadata_el = Element::new("metadata");
        metadata_el.append(trace_el);
        doc = doc.add(metadata_el);
    }

    for tree in group_trees(paths) {
        let members: Vec<&CurvePath> = tree.into_iter().map(|i| &paths[i]).collect();
        let d = build_path_data(&members);
        if d.is_empty() {
            continue;
        }
        let path = Path::new()
            .set("d", d)
            .set("fill", "black")
            .set("fill-rule", "nonzero");
        doc = doc.add(path);
    }

    // The svg crate omits the XML declaration, so we prepend it.
    let serialized = format!("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n{doc}\n");
    Ok(if options.minify {
        minify_svg(&serialized)
    } else {
        serialized
    })
}

/// Group path indices into containment trees, one per root (depth 0).
///
/// Members are ordered by index within each tree, which puts the outer
/// boundary first and nested boundaries in discovery order.
fn group_trees(paths: &[CurvePath]) -> Vec<Vec<usize>> {
    let root_of: Vec<usize> = (0..paths.len())
        .map(|mut i| {
            while let Some(parent) = paths[i].parent() {
                i = parent;
            }
            i
        })
        .collect();

    let mut trees: Vec<Vec<usize>> = Vec::new();
    let mut tree_of_root: Vec<Option<usize>> = vec![None; paths.len()];
    for (i, &root) in root_of.iter().enumerate() {
        let tree = match tree_of_root[root] {
            Some(t) => t,
            None => {
                trees.push(Vec::new());
                tree_of_root[root] = Some(trees.len() - 1);
                trees.len() - 1
            }
        };
        trees[tree].push(i);
    }
    trees
}
