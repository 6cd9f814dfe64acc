//! imdiff CLI - compare two images with basic metrics and MSSIM
//!
//! Prints the maximum absolute difference, PSNR and MSSIM between an exact
//! and a distorted image, or writes a visualized difference image.

use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{ColorChoice, Parser, ValueEnum};
use colored::Colorize;
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, GenericImageView, ImageEncoder};
use imdiff::{BasicMetrics, CompareParams, Comparison, Img, Metric, MssimStatus, PlanarImage};
use serde::Serialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Image difference metrics
///
/// Compares a distorted image against the exact (reference) image. Metrics
/// are reported for intensities on the 0..255 scale. Each RGB channel is
/// compared independently and the results are combined unless --separate
/// is given.
///
/// Metrics:
///   max    - Maximum absolute difference
///   mse    - Mean squared error
///   rmse   - Root mean squared error
///   psnr   - Peak signal-to-noise ratio, -10 log10(MSE) with MSE on [0,1]
///   mssim  - Mean structural similarity index
///
/// Without --metric, max, PSNR and MSSIM are printed together.
#[derive(Parser, Debug)]
#[command(name = "imdiff")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    Default metrics:
        imdiff exact.png distorted.jpg

    PSNR per channel, ignoring a 4-pixel border:
        imdiff -m psnr -s -p 4 exact.png distorted.jpg

    Write a difference image (mid-gray where equal, saturated at +/-D):
        imdiff -D 10 exact.png distorted.png diff.png

    Output JSON for scripting:
        imdiff --json exact.png distorted.png

EXIT CODES:
    0 - Success
    2 - Error (file not found, size mismatch, padding too large, etc.)")]
struct Cli {
    /// Exact (reference) image
    #[arg(value_name = "EXACT")]
    exact: PathBuf,

    /// Distorted image
    #[arg(value_name = "DISTORTED")]
    distorted: PathBuf,

    /// Write the difference image to this file instead of printing metrics
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Metric to print
    #[arg(short, long, value_enum, value_name = "METRIC")]
    metric: Option<MetricArg>,

    /// Compute metrics separately for each channel
    #[arg(short, long)]
    separate: bool,

    /// Remove an N-pixel border before comparison
    #[arg(short, long, default_value_t = 0, value_name = "N")]
    pad: usize,

    /// Difference image saturates at a difference of D
    #[arg(short = 'D', long, default_value_t = imdiff::DEFAULT_DIFFERENCE_SCALE, value_name = "D")]
    difference_scale: f32,

    /// Quality for saving the difference image as JPEG
    #[arg(
        short,
        long,
        default_value_t = imdiff::report::DEFAULT_JPEG_QUALITY,
        value_parser = clap::value_parser!(u8).range(1..=100),
        value_name = "QUALITY"
    )]
    quality: u8,

    /// Output JSON instead of text
    #[arg(long, conflicts_with = "output")]
    json: bool,

    /// Control color output
    #[arg(long, value_enum, default_value = "auto")]
    color: ColorChoice,

    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum MetricArg {
    /// Maximum absolute difference
    Max,
    /// Mean squared error
    Mse,
    /// Root mean squared error
    Rmse,
    /// Peak signal-to-noise ratio
    Psnr,
    /// Mean structural similarity
    Mssim,
}

impl From<MetricArg> for Metric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Max => Metric::Max,
            MetricArg::Mse => Metric::Mse,
            MetricArg::Rmse => Metric::Rmse,
            MetricArg::Psnr => Metric::Psnr,
            MetricArg::Mssim => Metric::Mssim,
        }
    }
}

#[derive(Serialize)]
struct JsonOutput {
    exact: String,
    distorted: String,
    width: usize,
    height: usize,
    metric: String,
    pad: usize,
    #[serde(flatten)]
    combined: JsonMetrics,
    /// `None` when skipped or when the image is too small for the window
    mssim: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    channels: Option<Vec<JsonMetrics>>,
}

/// Values on the 0..255 display scale; PSNR is `None` for identical data.
#[derive(Serialize)]
struct JsonMetrics {
    max: f32,
    mse: f32,
    rmse: f64,
    psnr: Option<f64>,
}

impl From<&BasicMetrics> for JsonMetrics {
    fn from(m: &BasicMetrics) -> Self {
        let psnr = m.psnr();
        Self {
            max: Comparison::display_max(m),
            mse: Comparison::display_mse(m),
            rmse: Comparison::display_rmse(m),
            psnr: psnr.is_finite().then_some(psnr),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    setup_logging(&cli);
    setup_colors(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn setup_logging(cli: &Cli) {
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn setup_colors(cli: &Cli) {
    match cli.color {
        ColorChoice::Always => colored::control::set_override(true),
        ColorChoice::Never => colored::control::set_override(false),
        ColorChoice::Auto => {
            // Disable colors if not a terminal
            if !io::stderr().is_terminal() {
                colored::control::set_override(false);
            }
        }
    }
}

fn params_from_cli(cli: &Cli) -> Result<CompareParams, String> {
    let params = CompareParams::new()
        .with_metric(cli.metric.map_or(Metric::Default, Metric::from))
        .with_separate_channels(cli.separate)
        .with_pad(cli.pad)
        .with_difference_scale(cli.difference_scale)
        .with_jpeg_quality(cli.quality);
    params.validate().map_err(|e| e.to_string())?;
    Ok(params)
}

fn run(cli: &Cli) -> Result<(), String> {
    let params = params_from_cli(cli)?;
    debug!(?params, "comparison parameters");

    let exact = load_image(&cli.exact)?;
    let distorted = load_image(&cli.distorted)?;

    if let Some(output) = &cli.output {
        let diff = Comparison::difference_image(&exact, &distorted, &params)
            .map_err(|e| e.to_string())?;
        save_difference_image(&diff, output, params.jpeg_quality())?;
        info!(path = %output.display(), "difference image written");
        return Ok(());
    }

    let start = Instant::now();
    let cmp = Comparison::compute(&exact, &distorted, &params).map_err(|e| e.to_string())?;
    debug!(elapsed = ?start.elapsed(), mssim = ?cmp.mssim, "metrics computed");

    if cli.json {
        output_json(cli, &params, &cmp)
    } else {
        let mut stdout = io::stdout().lock();
        for line in cmp.render(&params) {
            writeln!(stdout, "{line}").map_err(|e| format!("failed to write output: {e}"))?;
        }
        Ok(())
    }
}

fn load_image(path: &Path) -> Result<PlanarImage, String> {
    let img = image::open(path).map_err(|e| format!("failed to load '{}': {}", path.display(), e))?;
    let (width, height) = img.dimensions();
    debug!(
        path = %path.display(),
        width,
        height,
        color = ?img.color(),
        "decoded image"
    );

    let pixels: Vec<imdiff::RGB8> = img
        .to_rgb8()
        .pixels()
        .map(|p| imdiff::RGB8::new(p[0], p[1], p[2]))
        .collect();
    let img = Img::new(pixels, width as usize, height as usize);
    Ok(PlanarImage::from_rgb8(img.as_ref()))
}

fn save_difference_image(diff: &PlanarImage, path: &Path, quality: u8) -> Result<(), String> {
    let rgb = diff.to_rgb8().map_err(|e| e.to_string())?;
    let width = rgb.width() as u32;
    let height = rgb.height() as u32;
    let bytes: Vec<u8> = rgb
        .into_buf()
        .into_iter()
        .flat_map(|p| [p.r, p.g, p.b])
        .collect();

    let is_jpeg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"));

    if is_jpeg {
        let file = std::fs::File::create(path)
            .map_err(|e| format!("failed to create '{}': {}", path.display(), e))?;
        let mut writer = io::BufWriter::new(file);
        JpegEncoder::new_with_quality(&mut writer, quality)
            .write_image(&bytes, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| format!("failed to save '{}': {}", path.display(), e))?;
        writer
            .flush()
            .map_err(|e| format!("failed to save '{}': {}", path.display(), e))
    } else {
        image::save_buffer(path, &bytes, width, height, ExtendedColorType::Rgb8)
            .map_err(|e| format!("failed to save '{}': {}", path.display(), e))
    }
}

fn output_json(cli: &Cli, params: &CompareParams, cmp: &Comparison) -> Result<(), String> {
    let output = JsonOutput {
        exact: cli.exact.display().to_string(),
        distorted: cli.distorted.display().to_string(),
        width: cmp.width,
        height: cmp.height,
        metric: params.metric().to_string(),
        pad: params.pad(),
        combined: JsonMetrics::from(&cmp.combined),
        mssim: match cmp.mssim {
            MssimStatus::Value(v) => Some(v),
            MssimStatus::Skipped | MssimStatus::TooSmall => None,
        },
        channels: params
            .separate_channels()
            .then(|| cmp.per_channel.iter().map(JsonMetrics::from).collect()),
    };
    let json = serde_json::to_string_pretty(&output)
        .map_err(|e| format!("failed to serialize JSON: {e}"))?;
    println!("{json}");
    Ok(())
}
