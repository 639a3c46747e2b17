//! stencil-export: Pure serializers for trace results.
//!
//! Converts the path forests produced by `stencil-pipeline` into SVG
//! documents, with an optional minification post-pass. No I/O: every
//! function takes structured data and returns a `String`.

pub mod minify;
pub mod svg;

pub use minify::minify_svg;
pub use svg::{ExportError, SvgOptions, build_path_data, to_svg};
