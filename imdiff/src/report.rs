//! Metric selection and reporting.
//!
//! [`Comparison::compute`] runs the basic metrics once per channel and
//! MSSIM once over all channels, then [`Comparison::render`] formats the
//! requested metric on the 0..255 display scale.

use std::fmt;
use std::str::FromStr;

use crate::MetricError;
use crate::diff::{DEFAULT_DIFFERENCE_SCALE, difference_divisor, make_difference_image};
use crate::image::PlanarImage;
use crate::metrics::{BasicMetrics, basic_metrics, check_pad, psnr};
use crate::mssim::{compute_mssim, fits_window};

/// Metrics are displayed for intensities in `[0, DISPLAY_SCALING]`.
pub const DISPLAY_SCALING: f32 = 255.0;

/// Default JPEG quality for written difference images.
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Which metric to report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric {
    /// Max, PSNR and MSSIM together.
    #[default]
    Default,
    /// Maximum absolute difference.
    Max,
    /// Mean squared error.
    Mse,
    /// Root mean squared error.
    Rmse,
    /// Peak signal-to-noise ratio.
    Psnr,
    /// Mean structural similarity.
    Mssim,
}

impl Metric {
    /// Whether reporting this metric requires the MSSIM computation.
    #[must_use]
    pub fn needs_mssim(self) -> bool {
        matches!(self, Self::Default | Self::Mssim)
    }

    /// Name used on the command line and in JSON output.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Max => "max",
            Self::Mse => "mse",
            Self::Rmse => "rmse",
            Self::Psnr => "psnr",
            Self::Mssim => "mssim",
        }
    }
}

impl FromStr for Metric {
    type Err = MetricError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "default" => Ok(Self::Default),
            "max" => Ok(Self::Max),
            "mse" => Ok(Self::Mse),
            "rmse" => Ok(Self::Rmse),
            "psnr" => Ok(Self::Psnr),
            "mssim" => Ok(Self::Mssim),
            _ => Err(MetricError::UnknownMetric(s.to_string())),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Comparison parameters.
///
/// Use the builder pattern to construct:
/// ```rust
/// use imdiff::{CompareParams, Metric};
///
/// let params = CompareParams::new()
///     .with_metric(Metric::Psnr)
///     .with_pad(4)                   // ignore a 4-pixel border
///     .with_separate_channels(true); // one value per channel
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompareParams {
    metric: Metric,
    separate_channels: bool,
    pad: usize,
    difference_scale: f32,
    jpeg_quality: u8,
}

impl Default for CompareParams {
    fn default() -> Self {
        Self {
            metric: Metric::Default,
            separate_channels: false,
            pad: 0,
            difference_scale: DEFAULT_DIFFERENCE_SCALE,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl CompareParams {
    /// Creates a new `CompareParams` with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metric to report.
    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    /// Reports max/MSE/RMSE/PSNR per channel instead of combined.
    /// MSSIM is always combined.
    #[must_use]
    pub fn with_separate_channels(mut self, separate_channels: bool) -> Self {
        self.separate_channels = separate_channels;
        self
    }

    /// Sets the margin excluded from every statistic.
    #[must_use]
    pub fn with_pad(mut self, pad: usize) -> Self {
        self.pad = pad;
        self
    }

    /// Sets the `D` parameter of the difference image.
    #[must_use]
    pub fn with_difference_scale(mut self, difference_scale: f32) -> Self {
        self.difference_scale = difference_scale;
        self
    }

    /// Sets the JPEG quality (1 to 100) used when writing difference images.
    #[must_use]
    pub fn with_jpeg_quality(mut self, jpeg_quality: u8) -> Self {
        self.jpeg_quality = jpeg_quality;
        self
    }

    /// Metric to report.
    #[must_use]
    pub fn metric(&self) -> Metric {
        self.metric
    }

    /// Whether basic metrics are reported per channel.
    #[must_use]
    pub fn separate_channels(&self) -> bool {
        self.separate_channels
    }

    /// Border width excluded from every statistic.
    #[must_use]
    pub fn pad(&self) -> usize {
        self.pad
    }

    /// The `D` parameter of the difference image.
    #[must_use]
    pub fn difference_scale(&self) -> f32 {
        self.difference_scale
    }

    /// JPEG quality for written difference images.
    #[must_use]
    pub fn jpeg_quality(&self) -> u8 {
        self.jpeg_quality
    }

    /// Checks the scalar parameters.
    ///
    /// # Errors
    /// [`MetricError::InvalidScale`] or [`MetricError::InvalidQuality`].
    pub fn validate(&self) -> Result<(), MetricError> {
        difference_divisor(self.difference_scale)?;
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(MetricError::InvalidQuality(self.jpeg_quality));
        }
        Ok(())
    }
}

/// Outcome of the MSSIM part of a comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MssimStatus {
    /// The selected metric does not need MSSIM.
    Skipped,
    /// The image is too small for the window after padding.
    TooSmall,
    /// The index (1.0 for identical images).
    Value(f64),
}

impl MssimStatus {
    /// The index, if one was computed.
    #[must_use]
    pub fn value(self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}

/// All metrics between two images, on the normalized `[0, 1]` scale.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    /// Image width in pixels.
    pub width: usize,
    /// Image height in pixels.
    pub height: usize,
    /// One entry per channel.
    pub per_channel: Vec<BasicMetrics>,
    /// Max over channels and mean MSE over channels.
    pub combined: BasicMetrics,
    /// MSSIM over all channels, or why it is absent.
    pub mssim: MssimStatus,
}

impl Comparison {
    /// Compares `exact` (reference) against `distorted`.
    ///
    /// # Errors
    /// - [`MetricError::DimensionMismatch`] if sizes or channel counts differ.
    /// - [`MetricError::ChannelCount`] if the images have no channels.
    /// - [`MetricError::PadTooLarge`] if the pad removes the whole image.
    /// - [`MetricError::Allocation`] if MSSIM scratch space is unavailable.
    pub fn compute(
        exact: &PlanarImage,
        distorted: &PlanarImage,
        params: &CompareParams,
    ) -> Result<Self, MetricError> {
        check_pair(exact, distorted)?;
        let (width, height) = (exact.width(), exact.height());
        let pad = params.pad();
        check_pad(pad, width, height)?;

        let per_channel = (0..exact.channels())
            .map(|c| basic_metrics(exact.plane(c), distorted.plane(c), width, height, 1, pad))
            .collect::<Result<Vec<_>, _>>()?;

        let mut combined = BasicMetrics::default();
        for m in &per_channel {
            if m.max > combined.max {
                combined.max = m.max;
            }
            combined.mse += m.mse;
        }
        combined.mse /= per_channel.len().max(1) as f32;

        let mssim = if !params.metric().needs_mssim() {
            MssimStatus::Skipped
        } else if !fits_window(width, height, pad) {
            MssimStatus::TooSmall
        } else if combined.max == 0.0 {
            MssimStatus::Value(1.0)
        } else {
            MssimStatus::Value(compute_mssim(
                exact.data(),
                distorted.data(),
                width,
                height,
                exact.channels(),
                pad,
            )?)
        };

        Ok(Self {
            width,
            height,
            per_channel,
            combined,
            mssim,
        })
    }

    /// Builds the difference image `(A - B) / (2D/255) + 0.5` for display.
    ///
    /// The pad is validated as for [`Comparison::compute`] but does not
    /// crop the output.
    ///
    /// # Errors
    /// [`MetricError::DimensionMismatch`], [`MetricError::ChannelCount`],
    /// [`MetricError::PadTooLarge`] or [`MetricError::InvalidScale`].
    pub fn difference_image(
        exact: &PlanarImage,
        distorted: &PlanarImage,
        params: &CompareParams,
    ) -> Result<PlanarImage, MetricError> {
        check_pair(exact, distorted)?;
        check_pad(params.pad(), exact.width(), exact.height())?;
        let mut out = exact.clone();
        make_difference_image(
            out.data_mut(),
            distorted.data(),
            exact.width(),
            exact.height(),
            exact.channels(),
            params.difference_scale(),
        )?;
        Ok(out)
    }

    /// Maximum absolute difference on the display scale.
    #[must_use]
    pub fn display_max(m: &BasicMetrics) -> f32 {
        DISPLAY_SCALING * m.max
    }

    /// MSE on the display scale.
    #[must_use]
    pub fn display_mse(m: &BasicMetrics) -> f32 {
        DISPLAY_SCALING * DISPLAY_SCALING * m.mse
    }

    /// RMSE on the display scale.
    #[must_use]
    pub fn display_rmse(m: &BasicMetrics) -> f64 {
        f64::from(DISPLAY_SCALING) * m.rmse()
    }

    /// Formats the metric selected in `params`, one string per output line.
    #[must_use]
    pub fn render(&self, params: &CompareParams) -> Vec<String> {
        let values = |f: &dyn Fn(&BasicMetrics) -> String| -> String {
            if params.separate_channels() {
                self.per_channel.iter().map(f).collect::<Vec<_>>().join(" ")
            } else {
                f(&self.combined)
            }
        };
        let max = |m: &BasicMetrics| format_g(f64::from(Self::display_max(m)));
        let psnr_db = |m: &BasicMetrics| format!("{:.4}", psnr(f64::from(m.mse)));

        let mut lines = Vec::new();
        match params.metric() {
            Metric::Default => {
                lines.push(format!("Maximum absolute difference:  {}", values(&max)));
                lines.push(format!("Peak signal-to-noise ratio:   {}", values(&psnr_db)));
                match self.mssim {
                    MssimStatus::TooSmall => lines.push(TOO_SMALL.to_string()),
                    MssimStatus::Value(v) => {
                        lines.push(format!("Mean structural similarity:   {v:.4}"));
                    }
                    MssimStatus::Skipped => {}
                }
            }
            Metric::Max => lines.push(values(&max)),
            Metric::Mse => {
                lines.push(values(&|m: &BasicMetrics| format!("{:.4}", Self::display_mse(m))));
            }
            Metric::Rmse => {
                lines.push(values(&|m: &BasicMetrics| format!("{:.4}", Self::display_rmse(m))));
            }
            Metric::Psnr => lines.push(values(&psnr_db)),
            Metric::Mssim => match self.mssim {
                MssimStatus::Value(v) => lines.push(format!("{v:.4}")),
                _ => lines.push(TOO_SMALL.to_string()),
            },
        }
        lines
    }
}

const TOO_SMALL: &str = "Image size is too small to compute MSSIM.";

fn check_pair(a: &PlanarImage, b: &PlanarImage) -> Result<(), MetricError> {
    if !(a.same_size(b) && a.channels() == b.channels()) {
        return Err(MetricError::DimensionMismatch {
            w1: a.width(),
            h1: a.height(),
            w2: b.width(),
            h2: b.height(),
        });
    }
    if a.channels() == 0 {
        return Err(MetricError::ChannelCount(0));
    }
    Ok(())
}

/// Formats like C's `%g`: 6 significant digits, trailing zeros removed,
/// scientific notation outside `[1e-4, 1e6)`.
#[must_use]
pub fn format_g(v: f64) -> String {
    const PRECISION: i32 = 6;

    if v == 0.0 {
        return "0".to_string();
    }
    if !v.is_finite() {
        return format!("{v}");
    }

    // Exponent after rounding to PRECISION significant digits
    let sci = format!("{:.*e}", (PRECISION - 1) as usize, v);
    let (mantissa, exp) = sci.split_once('e').unwrap_or((&sci, "0"));
    let exp: i32 = exp.parse().unwrap_or(0);

    if exp < -4 || exp >= PRECISION {
        let mantissa = trim_zeros(mantissa);
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exp.abs())
    } else {
        let decimals = (PRECISION - 1 - exp).max(0) as usize;
        trim_zeros(&format!("{v:.decimals$}")).to_string()
    }
}

fn trim_zeros(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}
