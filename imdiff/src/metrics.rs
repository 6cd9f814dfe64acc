//! Maximum absolute difference and mean squared error.

use crate::MetricError;
use crate::image::check_len;

/// Per-call result of [`basic_metrics`].
///
/// Values are on the normalized `[0, 1]` intensity scale.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BasicMetrics {
    /// Maximum absolute difference, `max |A - B|`.
    pub max: f32,
    /// Mean squared error, `mean |A - B|²`.
    pub mse: f32,
}

impl BasicMetrics {
    /// Root mean squared error.
    #[must_use]
    pub fn rmse(&self) -> f64 {
        f64::from(self.mse).sqrt()
    }

    /// Peak signal-to-noise ratio in dB for a peak of 1.0.
    ///
    /// `f64::INFINITY` when the MSE is exactly zero.
    #[must_use]
    pub fn psnr(&self) -> f64 {
        psnr(f64::from(self.mse))
    }
}

/// `-10 log10(mse)`; infinite for identical images.
#[must_use]
pub fn psnr(mse: f64) -> f64 {
    -10.0 * mse.log10()
}

/// Checks that removing `pad` pixels on each side leaves a non-empty interior.
pub(crate) fn check_pad(pad: usize, width: usize, height: usize) -> Result<(), MetricError> {
    let margin = pad.saturating_mul(2);
    if width <= margin || height <= margin {
        Err(MetricError::PadTooLarge { pad, width, height })
    } else {
        Ok(())
    }
}

/// Computes the maximum absolute difference and the MSE between `a` and `b`.
///
/// Only the interior `[pad, width - pad) × [pad, height - pad)` of each of the
/// `channels` planes is considered. The squared error is accumulated in `f64`.
///
/// # Errors
/// - [`MetricError::BufferSize`] if a buffer does not match the geometry.
/// - [`MetricError::ChannelCount`] if `channels` is zero.
/// - [`MetricError::PadTooLarge`] if the interior is empty.
pub fn basic_metrics(
    a: &[f32],
    b: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    pad: usize,
) -> Result<BasicMetrics, MetricError> {
    check_len(a, width, height, channels)?;
    check_len(b, width, height, channels)?;
    check_pad(pad, width, height)?;

    let plane_len = width * height;
    let mut max = 0.0f32;
    let mut accum = 0.0f64;

    for c in 0..channels {
        for y in pad..height - pad {
            let start = c * plane_len + y * width;
            let row_a = &a[start + pad..start + width - pad];
            let row_b = &b[start + pad..start + width - pad];
            for (&va, &vb) in row_a.iter().zip(row_b) {
                let diff = (va - vb).abs();
                if max < diff {
                    max = diff;
                }
                accum += f64::from(diff * diff);
            }
        }
    }

    let count = channels * (width - 2 * pad) * (height - 2 * pad);
    Ok(BasicMetrics {
        max,
        mse: (accum / count as f64) as f32,
    })
}
