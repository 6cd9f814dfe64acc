//! # imdiff
//!
//! Quantitative comparison of two same-sized images, for validating
//! compression, restoration or deconvolution results against a reference.
//!
//! Metrics:
//! - Maximum absolute difference, `max_n |A_n - B_n|`
//! - Mean squared error, `1/N Σ |A_n - B_n|²`
//! - Root mean squared error, `MSE^½`
//! - Peak signal-to-noise ratio, `-10 log10(MSE)` on the `[0, 1]` scale
//! - Mean structural similarity (MSSIM), 11-tap Gaussian window, σ = 1.5
//!
//! A visualized difference image `(A - B) / (2D/255) + 0.5` can be produced
//! instead of metrics.
//!
//! Images are planar `f32` buffers (`[channel][row][col]`) with samples in
//! `[0, 1]`. Channels are compared independently.
//!
//! ## Example
//!
//! ```rust
//! use imdiff::{basic_metrics, compute_mssim};
//!
//! let width = 16;
//! let height = 16;
//! let a: Vec<f32> = (0..width * height).map(|n| (n % 7) as f32 / 7.0).collect();
//! let b: Vec<f32> = a.iter().map(|v| v + 0.01).collect();
//!
//! let m = basic_metrics(&a, &b, width, height, 1, 0)?;
//! assert!((m.max - 0.01).abs() < 1e-6);
//! println!("PSNR: {:.2} dB", m.psnr());
//!
//! let mssim = compute_mssim(&a, &b, width, height, 1, 0)?;
//! assert!(mssim > 0.99);
//! # Ok::<(), imdiff::MetricError>(())
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]
// Keep float expressions in the same order as the reference formulas
#![allow(clippy::suboptimal_flops)]
#![allow(clippy::many_single_char_names)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::float_cmp)]

pub mod boundary;
pub mod conv;
mod diff;
pub mod image;
pub mod kernel;
mod metrics;
mod mssim;
pub mod report;

pub use boundary::BoundaryExt;
pub use conv::{separable_conv2d, separable_conv2d_inplace};
pub use diff::{DEFAULT_DIFFERENCE_SCALE, make_difference_image};
pub use image::PlanarImage;
pub use kernel::Kernel;
pub use metrics::{BasicMetrics, basic_metrics, psnr};
pub use mssim::{MSSIM_C1, MSSIM_C2, compute_mssim, fits_window};
pub use report::{CompareParams, Comparison, Metric, MssimStatus};

// Re-export imgref and rgb types for convenience
pub use imgref::{Img, ImgRef, ImgVec};
pub use rgb::RGB8;

/// Error type for imdiff operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum MetricError {
    /// A scratch buffer or kernel could not be allocated.
    #[error("memory allocation failed ({len} samples)")]
    Allocation {
        /// Requested number of samples.
        len: usize,
    },
    /// Kernel parameters or taps are unusable.
    #[error("invalid kernel: {reason}")]
    InvalidKernel {
        /// What was wrong.
        reason: String,
    },
    /// Removing the pad leaves no pixels.
    #[error("removal of {pad}-pixel padding removes entire {width}x{height} image")]
    PadTooLarge {
        /// Requested pad.
        pad: usize,
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
    /// Removing the pad and the MSSIM window radius leaves no pixels.
    #[error(
        "image size {width}x{height} is too small to compute MSSIM with {pad}-pixel padding \
         (window radius {radius})"
    )]
    WindowTooLarge {
        /// Requested pad.
        pad: usize,
        /// Window radius.
        radius: usize,
        /// Image width.
        width: usize,
        /// Image height.
        height: usize,
    },
    /// Image dimensions don't match.
    #[error("image sizes don't match, {w1}x{h1} vs. {w2}x{h2}")]
    DimensionMismatch {
        /// First image width.
        w1: usize,
        /// First image height.
        h1: usize,
        /// Second image width.
        w2: usize,
        /// Second image height.
        h2: usize,
    },
    /// Buffer length doesn't match the given geometry.
    #[error("buffer size {actual} doesn't match expected size {expected}")]
    BufferSize {
        /// Expected number of samples.
        expected: usize,
        /// Actual number of samples.
        actual: usize,
    },
    /// Images need at least one channel; RGB output needs 1 or 3+.
    #[error("unsupported channel count {0}")]
    ChannelCount(usize),
    /// Difference image scale `D` must be positive.
    #[error("D must be positive, got {0}")]
    InvalidScale(f32),
    /// JPEG quality outside 1..=100.
    #[error("JPEG quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),
    /// Unknown boundary extension policy name.
    #[error("unknown boundary extension \"{0}\"")]
    UnknownBoundary(String),
    /// Unknown metric name.
    #[error("unknown metric \"{0}\"")]
    UnknownMetric(String),
}
