//! SVG minification post-pass.
//!
//! A purely cosmetic transform over an already-serialized document:
//! strips comments and `id` attributes, rounds path coordinates to a
//! fixed precision, collapses inter-tag whitespace, and guarantees a
//! `viewBox` so the document scales when embedded. The rendered
//! geometry is unchanged apart from the sub-precision rounding.

use std::fmt::Write;

/// Decimal places kept for path data coordinates.
const COORDINATE_PRECISION: i32 = 2;

/// Minify a serialized SVG document.
#[must_use]
pub fn minify_svg(svg: &str) -> String {
    let out = strip_comments(svg);
    let out = strip_id_attributes(&out);
    let out = round_path_data(&out);
    let out = ensure_viewbox(&out);
    collapse_whitespace(&out)
}

/// Remove `<!-- ... -->` comments (unterminated comments are dropped
/// to the end of input).
fn strip_comments(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;
    while let Some(start) = rest.find("<!--") {
        out.push_str(&rest[..start]);
        rest = rest[start..]
            .find("-->")
            .map_or("", |end| &rest[start + end + 3..]);
    }
    out.push_str(rest);
    out
}

/// Remove ` id="..."` attributes.
fn strip_id_attributes(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;
    while let Some(start) = rest.find(" id=\"") {
        out.push_str(&rest[..start]);
        rest = rest[start + 5..]
            .find('"')
            .map_or("", |end| &rest[start + 5 + end + 1..]);
    }
    out.push_str(rest);
    out
}

/// Round every number inside `d="..."` attribute values.
///
/// Only path data is touched: numbers elsewhere (the XML declaration
/// version, namespace URLs) must survive verbatim.
fn round_path_data(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut rest = svg;
    while let Some(start) = rest.find(" d=\"") {
        let value_start = start + 4;
        let Some(end) = rest[value_start..].find('"') else {
            break;
        };
        out.push_str(&rest[..value_start]);
        out.push_str(&round_numbers(&rest[value_start..value_start + end]));
        rest = &rest[value_start + end..];
    }
    out.push_str(rest);
    out
}

/// Round each numeric token in a path data string.
fn round_numbers(data: &str) -> String {
    let mut out = String::with_capacity(data.len());
    let mut token = String::new();
    for c in data.chars() {
        if c.is_ascii_digit() || c == '.' || c == '-' {
            token.push(c);
        } else {
            flush_number(&mut out, &mut token);
            out.push(c);
        }
    }
    flush_number(&mut out, &mut token);
    out
}

fn flush_number(out: &mut String, token: &mut String) {
    if token.is_empty() {
        return;
    }
    if let Ok(value) = token.parse::<f64>() {
        let scale = f64::from(10_i32.pow(COORDINATE_PRECISION.unsigned_abs()));
        let rounded = (value * scale).round() / scale;
        // `{}` prints the shortest representation, so 25.00 comes out
        // as "25" and 12.35 stays "12.35".
        let _ = write!(out, "{rounded}");
    } else {
        out.push_str(token);
    }
    token.clear();
}

/// Insert a `viewBox` derived from `width`/`height` when the root
/// `<svg>` tag lacks one.
fn ensure_viewbox(svg: &str) -> String {
    let Some(tag_start) = svg.find("<svg") else {
        return svg.to_owned();
    };
    let Some(tag_len) = svg[tag_start..].find('>') else {
        return svg.to_owned();
    };
    let tag = &svg[tag_start..tag_start + tag_len];
    if tag.contains("viewBox=") {
        return svg.to_owned();
    }
    let (Some(width), Some(height)) = (attribute(tag, "width"), attribute(tag, "height")) else {
        return svg.to_owned();
    };

    let mut out = String::with_capacity(svg.len() + 32);
    out.push_str(&svg[..tag_start + 4]);
    let _ = write!(out, " viewBox=\"0 0 {width} {height}\"");
    out.push_str(&svg[tag_start + 4..]);
    out
}

/// Extract a plain-number attribute value from a tag string.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let pattern = format!(" {name}=\"");
    let start = tag.find(&pattern)? + pattern.len();
    let end = tag[start..].find('"')?;
    let value = &tag[start..start + end];
    value
        .chars()
        .all(|c| c.is_ascii_digit())
        .then_some(value)
}

/// Drop whitespace runs between tags and collapse any remaining runs
/// to a single space.
fn collapse_whitespace(svg: &str) -> String {
    let mut out = String::with_capacity(svg.len());
    let mut chars = svg.chars().peekable();
    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            while chars.peek().is_some_and(|n| n.is_whitespace()) {
                chars.next();
            }
            // Whitespace between a closing '>' and an opening '<' is
            // purely formatting.
            let between_tags = out.ends_with('>') && chars.peek() == Some(&'<');
            if !between_tags && !out.is_empty() && chars.peek().is_some() {
                out.push(' ');
            }
        } else {
            out.push(c);
        }
    }
    out
}
