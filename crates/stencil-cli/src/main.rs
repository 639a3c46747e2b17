//! stencil: CLI front-end for the tracing pipeline.
//!
//! Decodes a raster image, runs the silhouette tracing pipeline with
//! configurable parameters, and writes the results as an SVG outline
//! and/or a black/transparent PNG mask. Also prints per-stage count
//! diagnostics, useful for:
//!
//! - Tuning the luma threshold, blur sigma, and speckle suppression
//! - Comparing curve fitting strategies (`smooth` vs `polygonal`)
//! - Checking how dithering changes the binarized coverage
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin stencil -- [OPTIONS] <IMAGE_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, ValueEnum};
use stencil_pipeline::{Dimensions, TraceConfig};

/// Trace raster silhouettes into vector SVG outlines and binary masks.
///
/// Runs the tracing pipeline on a given image with configurable
/// parameters and prints per-stage count diagnostics.
#[derive(Parser)]
#[command(name = "stencil", version)]
struct Cli {
    /// Path to the input image (PNG, JPEG, BMP, WebP).
    image_path: PathBuf,

    /// Luma threshold: pixels darker than this (and not fully
    /// transparent) become opaque.
    #[arg(long, default_value_t = TraceConfig::DEFAULT_THRESHOLD)]
    threshold: u8,

    /// Gaussian blur sigma applied before thresholding (0 disables).
    #[arg(long, default_value_t = TraceConfig::DEFAULT_BLUR_RADIUS)]
    blur_radius: f32,

    /// Resize to exact dimensions before tracing, as WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_dimensions)]
    downscale: Option<Dimensions>,

    /// Resampling filter used with --downscale.
    #[arg(long, value_enum, default_value_t = CLI_DEFAULT_FILTER)]
    downscale_filter: Filter,

    /// Convert to grayscale before blur/downscale instead of after.
    #[arg(long)]
    grayscale_first: bool,

    /// Dithering applied to luma before the threshold comparison.
    #[arg(long, value_enum, default_value_t = Dither::None)]
    dither: Dither,

    /// Minimum enclosed area in pixels² for a contour to survive
    /// speckle suppression.
    #[arg(long, default_value_t = TraceConfig::DEFAULT_TURDSIZE)]
    turdsize: u32,

    /// Corner smoothness threshold: a vertex is smooth iff its turning
    /// angle is below alphamax * pi/4 radians. 0 forces all corners;
    /// useful range is 0 to 3.5.
    #[arg(long, default_value_t = TraceConfig::DEFAULT_ALPHAMAX)]
    alphamax: f64,

    /// Curve fitting tolerance in pixels (0 = straight lines only).
    #[arg(long, default_value_t = TraceConfig::DEFAULT_OPTTOLERANCE)]
    opttolerance: f64,

    /// Minify the SVG output.
    #[arg(long)]
    minify: bool,

    /// Reject inputs whose dimensions differ from WIDTHxHEIGHT.
    #[arg(long, value_parser = parse_dimensions)]
    required_size: Option<Dimensions>,

    /// Reject inputs with a side longer than this many pixels.
    #[arg(long, default_value_t = TraceConfig::DEFAULT_MAX_DIMENSION, value_parser = clap::builder::RangedU64ValueParser::<u32>::new().range(1..))]
    max_dimension: u32,

    /// Contour tracing algorithm.
    #[arg(long, value_enum, default_value_t = Tracer::EdgeFollowing)]
    tracer: Tracer,

    /// Curve fitting strategy.
    #[arg(long, value_enum, default_value_t = Fitter::Smooth)]
    fitter: Fitter,

    /// Write SVG output to file.
    #[arg(long)]
    svg: Option<PathBuf>,

    /// Write the black/transparent PNG mask to file.
    #[arg(long)]
    mask: Option<PathBuf>,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,

    /// Full pipeline config as a JSON string.
    ///
    /// When provided, all other pipeline parameter flags are ignored.
    /// The JSON must be a valid `TraceConfig` serialization.
    #[arg(long)]
    config_json: Option<String>,
}

/// Dithering mode selection.
#[derive(Clone, Copy, ValueEnum)]
enum Dither {
    /// Plain threshold, no dithering.
    None,
    /// Ordered dithering with a 4x4 Bayer matrix.
    Ordered,
    /// Floyd-Steinberg error diffusion.
    ErrorDiffusion,
}

/// Downscale resampling filter selection.
#[derive(Clone, Copy, ValueEnum)]
enum Filter {
    /// Nearest-neighbor (fastest, blocky).
    Nearest,
    /// Bilinear interpolation (fast, decent quality).
    Triangle,
    /// Bicubic Catmull-Rom (moderate, good quality).
    CatmullRom,
    /// Gaussian (moderate, smooth).
    Gaussian,
    /// Lanczos with 3 lobes (slowest, sharpest).
    Lanczos3,
}

/// Contour tracing algorithm selection.
#[derive(Clone, Copy, ValueEnum)]
enum Tracer {
    /// Edge-following walk along pixel boundaries with XOR decomposition.
    EdgeFollowing,
}

/// Curve fitting strategy selection.
#[derive(Clone, Copy, ValueEnum)]
enum Fitter {
    /// Least-squares cubic Bézier fitting between corners.
    Smooth,
    /// Straight line segments only.
    Polygonal,
}

/// Maps a [`stencil_pipeline::DownscaleFilter`] to the local CLI
/// [`Filter`] enum.
const fn filter_from_pipeline(f: stencil_pipeline::DownscaleFilter) -> Filter {
    match f {
        stencil_pipeline::DownscaleFilter::Nearest => Filter::Nearest,
        stencil_pipeline::DownscaleFilter::Triangle => Filter::Triangle,
        stencil_pipeline::DownscaleFilter::CatmullRom => Filter::CatmullRom,
        stencil_pipeline::DownscaleFilter::Gaussian => Filter::Gaussian,
        stencil_pipeline::DownscaleFilter::Lanczos3 => Filter::Lanczos3,
    }
}

/// The CLI default filter, derived from the pipeline default so the
/// two cannot silently diverge.
const CLI_DEFAULT_FILTER: Filter = {
    // `DownscaleFilter::default()` is not const; Triangle is the
    // documented default and the match below breaks if it changes.
    filter_from_pipeline(stencil_pipeline::DownscaleFilter::Triangle)
};

/// Parse a `WIDTHxHEIGHT` string such as `4096x4096`.
fn parse_dimensions(s: &str) -> Result<Dimensions, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got {s:?}"))?;
    let width: u32 = w
        .parse()
        .map_err(|e| format!("invalid width {w:?}: {e}"))?;
    let height: u32 = h
        .parse()
        .map_err(|e| format!("invalid height {h:?}: {e}"))?;
    if width == 0 || height == 0 {
        return Err(format!("dimensions must be non-zero, got {s:?}"));
    }
    Ok(Dimensions::new(width, height))
}

/// Build a [`TraceConfig`] from CLI arguments.
///
/// If `--config-json` is provided, the JSON is parsed directly and all
/// individual parameter flags are ignored.  Otherwise, a config is
/// assembled from the individual flags.
fn config_from_cli(cli: &Cli) -> Result<TraceConfig, String> {
    if let Some(ref json) = cli.config_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"));
    }

    Ok(TraceConfig {
        threshold: cli.threshold,
        blur_radius: cli.blur_radius,
        downscale: cli.downscale,
        downscale_filter: match cli.downscale_filter {
            Filter::Nearest => stencil_pipeline::DownscaleFilter::Nearest,
            Filter::Triangle => stencil_pipeline::DownscaleFilter::Triangle,
            Filter::CatmullRom => stencil_pipeline::DownscaleFilter::CatmullRom,
            Filter::Gaussian => stencil_pipeline::DownscaleFilter::Gaussian,
            Filter::Lanczos3 => stencil_pipeline::DownscaleFilter::Lanczos3,
        },
        grayscale_first: cli.grayscale_first,
        dither: match cli.dither {
            Dither::None => stencil_pipeline::DitherMode::None,
            Dither::Ordered => stencil_pipeline::DitherMode::Ordered,
            Dither::ErrorDiffusion => stencil_pipeline::DitherMode::ErrorDiffusion,
        },
        turdsize: cli.turdsize,
        alphamax: cli.alphamax,
        opttolerance: cli.opttolerance,
        minify: cli.minify,
        required_size: cli.required_size,
        max_dimension: cli.max_dimension,
        contour_tracer: match cli.tracer {
            Tracer::EdgeFollowing => stencil_pipeline::ContourTracerKind::EdgeFollowing,
        },
        curve_fitter: match cli.fitter {
            Fitter::Smooth => stencil_pipeline::CurveFitterKind::Smooth,
            Fitter::Polygonal => stencil_pipeline::CurveFitterKind::Polygonal,
        },
    })
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let decode_start = Instant::now();
    let image = match image::open(&cli.image_path) {
        Ok(decoded) => decoded.to_rgba8(),
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.image_path.display());
            return ExitCode::FAILURE;
        }
    };
    let decode_duration = decode_start.elapsed();

    eprintln!(
        "Image: {} ({}x{})",
        cli.image_path.display(),
        image.width(),
        image.height(),
    );
    eprintln!("Config: {config:#?}");
    eprintln!();

    let trace_start = Instant::now();
    let (result, diagnostics) = match stencil_pipeline::process_with_diagnostics(&image, &config) {
        Ok(output) => output,
        Err(e) => {
            eprintln!("Trace error: {e}");
            return ExitCode::FAILURE;
        }
    };
    let trace_duration = trace_start.elapsed();

    if cli.json {
        match serde_json::to_string_pretty(&diagnostics) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing diagnostics: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        println!("{}", diagnostics.report());
        println!();
        println!(
            "Decode: {:.3}ms  Trace: {:.3}ms",
            decode_duration.as_secs_f64() * 1000.0,
            trace_duration.as_secs_f64() * 1000.0,
        );
    }

    if let Some(ref svg_path) = cli.svg {
        let title = cli
            .image_path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("trace");
        let config_json = match serde_json::to_string(&config) {
            Ok(json) => json,
            Err(e) => {
                eprintln!("Error serializing config: {e}");
                return ExitCode::FAILURE;
            }
        };
        let options = stencil_export::SvgOptions {
            minify: config.minify,
            title: Some(title),
            description: None,
            config_json: Some(&config_json),
        };
        let svg = match stencil_export::to_svg(&result.paths, result.dimensions, &options) {
            Ok(svg) => svg,
            Err(e) => {
                eprintln!("SVG export error: {e}");
                return ExitCode::FAILURE;
            }
        };
        match std::fs::write(svg_path, &svg) {
            Ok(()) => {
                eprintln!("SVG written to {} ({} bytes)", svg_path.display(), svg.len());
            }
            Err(e) => {
                eprintln!("Error writing SVG to {}: {e}", svg_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    if let Some(ref mask_path) = cli.mask {
        let mask = stencil_pipeline::mask::to_mask_image(&result.bitmap);
        match mask.save(mask_path) {
            Ok(()) => {
                eprintln!("Mask written to {}", mask_path.display());
            }
            Err(e) => {
                eprintln!("Error writing mask to {}: {e}", mask_path.display());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_parse_from_wxh() {
        assert_eq!(parse_dimensions("4096x4096").unwrap(), Dimensions::new(4096, 4096));
        assert_eq!(parse_dimensions("800X600").unwrap(), Dimensions::new(800, 600));
    }

    #[test]
    fn malformed_dimensions_are_rejected() {
        assert!(parse_dimensions("4096").is_err());
        assert!(parse_dimensions("x600").is_err());
        assert!(parse_dimensions("0x600").is_err());
        assert!(parse_dimensions("800x-1").is_err());
    }

    #[test]
    fn config_json_overrides_flags() {
        let mut cli = Cli::parse_from(["stencil", "input.png", "--threshold", "10"]);
        cli.config_json = Some(r#"{"threshold":99}"#.to_owned());
        // Partial JSON is invalid: the full config must round-trip.
        assert!(config_from_cli(&cli).is_err());

        let full = serde_json::to_string(&TraceConfig {
            threshold: 99,
            ..TraceConfig::default()
        })
        .unwrap();
        cli.config_json = Some(full);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.threshold, 99);
    }

    #[test]
    fn flags_assemble_a_config() {
        let cli = Cli::parse_from([
            "stencil",
            "input.png",
            "--threshold",
            "128",
            "--turdsize",
            "0",
            "--dither",
            "ordered",
            "--fitter",
            "polygonal",
            "--downscale",
            "512x512",
        ]);
        let config = config_from_cli(&cli).unwrap();
        assert_eq!(config.threshold, 128);
        assert_eq!(config.turdsize, 0);
        assert_eq!(config.dither, stencil_pipeline::DitherMode::Ordered);
        assert_eq!(config.curve_fitter, stencil_pipeline::CurveFitterKind::Polygonal);
        assert_eq!(config.downscale, Some(Dimensions::new(512, 512)));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
