//! Mean structural similarity (MSSIM).
//!
//! SSIM formula:
//! SSIM(a,b) = (2·μa·μb + C1)(2·σab + C2) / ((μa² + μb² + C1)(σa² + σb² + C2))
//!
//! Where:
//! - μa, μb = local means (Gaussian-weighted, σ = 1.5, 11 taps)
//! - σa² = blur(a²) - μa², σb² = blur(b²) - μb²
//! - σab = blur(a·b) - μa·μb
//!
//! The per-pixel index is averaged over the interior of every channel. The
//! interior is eroded by the window radius beyond the caller's pad, so no
//! window touching a synthesized boundary sample contributes.

use crate::MetricError;
use crate::boundary::BoundaryExt;
use crate::conv::{separable_conv2d, separable_conv2d_inplace};
use crate::image::{check_len, try_zeroed};
use crate::kernel::{Kernel, MSSIM_RADIUS};

/// K1 = 0.01, C1 = K1².
pub const MSSIM_C1: f64 = 0.01 * 0.01;
/// K2 = 0.03, C2 = K2².
pub const MSSIM_C2: f64 = 0.03 * 0.03;

/// Whether an image of this size leaves pixels after removing `pad` plus the
/// window radius on every side.
#[must_use]
pub fn fits_window(width: usize, height: usize, pad: usize) -> bool {
    let margin = pad.saturating_add(MSSIM_RADIUS).saturating_mul(2);
    width > margin && height > margin
}

/// Computes the MSSIM index between `a` and `b`.
///
/// Both buffers hold `channels` planes of `width * height` samples. Channels
/// are filtered independently and the result averages over all of them.
///
/// # Errors
/// - [`MetricError::BufferSize`] if a buffer does not match the geometry.
/// - [`MetricError::ChannelCount`] if `channels` is zero.
/// - [`MetricError::WindowTooLarge`] if no pixel survives the erosion by
///   `pad` plus the window radius.
/// - [`MetricError::Allocation`] if the window or a scratch buffer cannot be
///   allocated.
pub fn compute_mssim(
    a: &[f32],
    b: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    pad: usize,
) -> Result<f64, MetricError> {
    check_len(a, width, height, channels)?;
    check_len(b, width, height, channels)?;
    if !fits_window(width, height, pad) {
        return Err(MetricError::WindowTooLarge {
            pad,
            radius: MSSIM_RADIUS,
            width,
            height,
        });
    }

    let window = Kernel::mssim_window()?;
    // Boundary does not matter, only the interior is read back
    let boundary = BoundaryExt::MSSIM;

    let plane_len = width * height;
    let len = plane_len * channels;
    let mut scratch = try_zeroed(plane_len)?;
    let mut mu_a = try_zeroed(len)?;
    let mut mu_b = try_zeroed(len)?;
    let mut mu_aa = try_zeroed(len)?;
    let mut mu_bb = try_zeroed(len)?;
    let mut mu_ab = try_zeroed(len)?;

    separable_conv2d(
        &mut mu_a, &mut scratch, a, &window, &window, boundary, width, height, channels,
    )?;
    separable_conv2d(
        &mut mu_b, &mut scratch, b, &window, &window, boundary, width, height, channels,
    )?;

    for (n, (&va, &vb)) in a.iter().zip(b).enumerate() {
        mu_aa[n] = va * va;
        mu_bb[n] = vb * vb;
        mu_ab[n] = va * vb;
    }

    for moment in [&mut mu_aa, &mut mu_bb, &mut mu_ab] {
        separable_conv2d_inplace(
            moment, &mut scratch, &window, &window, boundary, width, height, channels,
        )?;
    }

    let margin = pad + MSSIM_RADIUS;
    let mut sum = 0.0f64;

    for c in 0..channels {
        for y in margin..height - margin {
            let start = c * plane_len + y * width;
            for n in start + margin..start + width - margin {
                sum += ssim_at(mu_a[n], mu_b[n], mu_aa[n], mu_bb[n], mu_ab[n]);
            }
        }
    }

    let count = channels * (width - 2 * margin) * (height - 2 * margin);
    Ok(sum / count as f64)
}

/// SSIM of one window from its first and second moments.
#[inline]
fn ssim_at(mu_a: f32, mu_b: f32, mu_aa: f32, mu_bb: f32, mu_ab: f32) -> f64 {
    // Products in f32, matching the buffers they come from
    let mu_a_sqr = f64::from(mu_a * mu_a);
    let mu_b_sqr = f64::from(mu_b * mu_b);
    let mu_a_mu_b = f64::from(mu_a * mu_b);
    let sigma_a_sqr = f64::from(mu_aa) - mu_a_sqr;
    let sigma_b_sqr = f64::from(mu_bb) - mu_b_sqr;
    let sigma_ab = f64::from(mu_ab) - mu_a_mu_b;

    ((2.0 * mu_a_mu_b + MSSIM_C1) * (2.0 * sigma_ab + MSSIM_C2))
        / ((mu_a_sqr + mu_b_sqr + MSSIM_C1) * (sigma_a_sqr + sigma_b_sqr + MSSIM_C2))
}
