//! End-to-end scenarios: raster image -> traced paths -> SVG, with
//! rasterization round-trips checking that the vector output actually
//! covers the same pixels as the binarized input.

#![allow(clippy::unwrap_used)]

use stencil_export::{SvgOptions, to_svg};
use stencil_pipeline::{
    Orientation, Point, RgbaImage, Segment, TraceConfig, TraceResult, process,
};
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Transform};

const BLACK: image::Rgba<u8> = image::Rgba([0, 0, 0, 255]);
const WHITE: image::Rgba<u8> = image::Rgba([255, 255, 255, 255]);

/// 100x100 white canvas with a black 50x50 square at (25, 25).
fn square_image() -> RgbaImage {
    RgbaImage::from_fn(100, 100, |x, y| {
        if (25..75).contains(&x) && (25..75).contains(&y) {
            BLACK
        } else {
            WHITE
        }
    })
}

/// The square image with a 20x20 white hole punched at (40, 40).
fn holed_square_image() -> RgbaImage {
    let mut image = square_image();
    for y in 40..60 {
        for x in 40..60 {
            image.put_pixel(x, y, WHITE);
        }
    }
    image
}

fn exact_config() -> TraceConfig {
    TraceConfig {
        turdsize: 0,
        opttolerance: 0.0,
        ..TraceConfig::default()
    }
}

/// Rasterize a trace result's paths with the nonzero fill rule,
/// without anti-aliasing so coverage is exact.
fn rasterize(result: &TraceResult) -> Pixmap {
    let mut builder = PathBuilder::new();
    for path in &result.paths {
        let start = path.start();
        #[allow(clippy::cast_possible_truncation)]
        builder.move_to(start.x as f32, start.y as f32);
        for segment in path.segments() {
            #[allow(clippy::cast_possible_truncation)]
            match *segment {
                Segment::Line { end } => builder.line_to(end.x as f32, end.y as f32),
                Segment::Cubic { c1, c2, end } => builder.cubic_to(
                    c1.x as f32,
                    c1.y as f32,
                    c2.x as f32,
                    c2.y as f32,
                    end.x as f32,
                    end.y as f32,
                ),
            }
        }
        builder.close();
    }

    let mut pixmap = Pixmap::new(result.dimensions.width, result.dimensions.height).unwrap();
    if let Some(path) = builder.finish() {
        let mut paint = Paint::default();
        paint.set_color_rgba8(0, 0, 0, 255);
        paint.anti_alias = false;
        pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
    }
    pixmap
}

/// Count pixels where the rasterized paths disagree with the bitmap.
fn coverage_mismatch(result: &TraceResult) -> u64 {
    let pixmap = rasterize(result);
    let mut mismatches = 0;
    for y in 0..result.dimensions.height {
        for x in 0..result.dimensions.width {
            #[allow(clippy::cast_possible_wrap)]
            let expected = result.bitmap.get(x as i32, y as i32);
            let actual = pixmap.pixel(x, y).is_some_and(|p| p.alpha() > 127);
            if expected != actual {
                mismatches += 1;
            }
        }
    }
    mismatches
}

#[test]
fn square_traces_to_one_outer_with_four_line_segments() {
    let result = process(&square_image(), &exact_config()).unwrap();

    assert_eq!(result.paths.len(), 1);
    let path = &result.paths[0];
    assert_eq!(path.orientation(), Orientation::Outer);
    assert_eq!(path.segments().len(), 4);
    assert!(path
        .segments()
        .iter()
        .all(|s| matches!(s, Segment::Line { .. })));

    // Corner coordinates land exactly on the pixel boundaries.
    let mut corners: Vec<Point> = vec![path.start()];
    corners.extend(path.segments().iter().take(3).map(Segment::end));
    for corner in corners {
        assert!(corner.x == 25.0 || corner.x == 75.0, "x = {}", corner.x);
        assert!(corner.y == 25.0 || corner.y == 75.0, "y = {}", corner.y);
    }
}

#[test]
fn square_svg_has_one_closed_path() {
    let result = process(&square_image(), &exact_config()).unwrap();
    let svg = to_svg(&result.paths, result.dimensions, &SvgOptions::default()).unwrap();

    assert_eq!(svg.matches("<path").count(), 1);
    assert!(svg.contains(r#"viewBox="0 0 100 100""#));
    assert!(svg.contains(r#"fill-rule="nonzero""#));

    let d_start = svg.find("d=\"").unwrap() + 3;
    let d = &svg[d_start..d_start + svg[d_start..].find('"').unwrap()];
    assert_eq!(d.matches('M').count(), 1);
    assert_eq!(d.matches('z').count(), 1);
}

#[test]
fn square_rasterizes_back_to_its_own_pixels() {
    let result = process(&square_image(), &exact_config()).unwrap();
    assert_eq!(result.bitmap.count_opaque(), 2500);
    assert_eq!(coverage_mismatch(&result), 0);
}

#[test]
fn holed_square_yields_outer_and_hole_with_opposite_winding() {
    let result = process(&holed_square_image(), &exact_config()).unwrap();

    assert_eq!(result.paths.len(), 2);
    let outer = &result.paths[0];
    let hole = &result.paths[1];
    assert_eq!(outer.orientation(), Orientation::Outer);
    assert_eq!(hole.orientation(), Orientation::Hole);
    assert_eq!(hole.parent(), Some(0));
    assert_eq!(hole.depth(), 1);
}

#[test]
fn holed_square_svg_is_one_path_with_two_subpaths() {
    let result = process(&holed_square_image(), &exact_config()).unwrap();
    let svg = to_svg(&result.paths, result.dimensions, &SvgOptions::default()).unwrap();

    assert_eq!(svg.matches("<path").count(), 1);
    let d_start = svg.find("d=\"").unwrap() + 3;
    let d = &svg[d_start..d_start + svg[d_start..].find('"').unwrap()];
    assert_eq!(d.matches('M').count(), 2);
    assert_eq!(d.matches('z').count(), 2);
}

#[test]
fn holed_square_renders_the_hole_as_a_gap() {
    let result = process(&holed_square_image(), &exact_config()).unwrap();
    let pixmap = rasterize(&result);

    // Inside the ring: opaque. Inside the hole: transparent.
    assert!(pixmap.pixel(30, 30).is_some_and(|p| p.alpha() == 255));
    assert!(pixmap.pixel(50, 50).is_some_and(|p| p.alpha() == 0));
    // Outside the square: transparent.
    assert!(pixmap.pixel(10, 10).is_some_and(|p| p.alpha() == 0));

    assert_eq!(coverage_mismatch(&result), 0);
}

#[test]
fn blank_canvas_exports_a_valid_empty_svg() {
    let image = RgbaImage::from_pixel(64, 64, WHITE);
    let result = process(&image, &exact_config()).unwrap();
    assert!(result.paths.is_empty());

    let svg = to_svg(&result.paths, result.dimensions, &SvgOptions::default()).unwrap();
    assert!(svg.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
    assert!(svg.contains(r#"viewBox="0 0 64 64""#));
    assert!(!svg.contains("<path"));
}

#[test]
fn minified_output_keeps_the_geometry() {
    let result = process(&holed_square_image(), &exact_config()).unwrap();
    let pretty = to_svg(&result.paths, result.dimensions, &SvgOptions::default()).unwrap();
    let minified = to_svg(
        &result.paths,
        result.dimensions,
        &SvgOptions {
            minify: true,
            ..SvgOptions::default()
        },
    )
    .unwrap();

    assert!(minified.len() <= pretty.len());
    assert!(minified.contains("viewBox"));
    assert_eq!(minified.matches("<path").count(), 1);
    assert_eq!(minified.matches('M').count(), 2);
}

#[test]
fn smooth_fit_of_a_disc_stays_within_tolerance() {
    // A filled disc: default smoothness settings should produce curves
    // whose rasterization still closely matches the bitmap.
    let image = RgbaImage::from_fn(100, 100, |x, y| {
        let dx = f64::from(x) - 49.5;
        let dy = f64::from(y) - 49.5;
        if dx.hypot(dy) < 35.0 { BLACK } else { WHITE }
    });
    let config = TraceConfig {
        turdsize: 0,
        ..TraceConfig::default()
    };
    let result = process(&image, &config).unwrap();
    assert_eq!(result.paths.len(), 1);
    assert!(result
        .paths[0]
        .segments()
        .iter()
        .any(|s| matches!(s, Segment::Cubic { .. })));

    // Allow a thin annulus of disagreement around the boundary: the
    // circumference is ~220 px, and fitting may shift the edge by up
    // to about a pixel.
    let mismatch = coverage_mismatch(&result);
    assert!(mismatch < 500, "mismatch = {mismatch}");
}

#[test]
fn json_config_round_trips_into_identical_output() {
    let config = exact_config();
    let json = serde_json::to_string(&config).unwrap();
    let reparsed: TraceConfig = serde_json::from_str(&json).unwrap();

    let image = holed_square_image();
    assert_eq!(
        process(&image, &config).unwrap(),
        process(&image, &reparsed).unwrap(),
    );
}
