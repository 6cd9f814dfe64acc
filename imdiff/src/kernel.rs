//! 1D convolution kernels.
//!
//! A [`Kernel`] is an odd-length tap sequence centered on its middle tap.
//! Construction is the only fallible step; a constructed kernel is always
//! odd-length and non-empty.

use crate::MetricError;

/// Standard deviation of the MSSIM window.
pub const MSSIM_SIGMA: f32 = 1.5;

/// Radius of the MSSIM window (11 taps).
pub const MSSIM_RADIUS: usize = 5;

/// Immutable odd-length 1D filter.
#[derive(Debug, Clone, PartialEq)]
pub struct Kernel {
    taps: Vec<f32>,
}

impl Kernel {
    /// Builds a normalized Gaussian sampling kernel.
    ///
    /// `tap[i] = exp(-i² / (2σ²))` for `i` in `-radius..=radius`, scaled so
    /// that the taps sum to 1.
    ///
    /// # Errors
    /// - [`MetricError::InvalidKernel`] if `sigma` is not finite and positive.
    /// - [`MetricError::Allocation`] if the taps cannot be allocated.
    pub fn gaussian(sigma: f32, radius: usize) -> Result<Self, MetricError> {
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(MetricError::InvalidKernel {
                reason: format!("sigma must be positive and finite, got {sigma}"),
            });
        }

        let len = radius
            .checked_mul(2)
            .and_then(|n| n.checked_add(1))
            .ok_or(MetricError::Allocation { len: usize::MAX })?;
        let mut taps = Vec::new();
        taps.try_reserve_exact(len)
            .map_err(|_| MetricError::Allocation { len })?;

        let scaler = -1.0 / (2.0 * sigma * sigma);
        let r = radius as isize;
        for i in -r..=r {
            let x = i as f32;
            taps.push((scaler * x * x).exp());
        }

        let inv_sum = 1.0 / taps.iter().sum::<f32>();
        for t in &mut taps {
            *t *= inv_sum;
        }

        Ok(Self { taps })
    }

    /// The 11-tap σ=1.5 window used for MSSIM.
    ///
    /// # Errors
    /// Propagates allocation failure from [`Kernel::gaussian`].
    pub fn mssim_window() -> Result<Self, MetricError> {
        Self::gaussian(MSSIM_SIGMA, MSSIM_RADIUS)
    }

    /// Wraps explicit taps. The center tap is `taps[taps.len() / 2]`.
    ///
    /// # Errors
    /// Returns [`MetricError::InvalidKernel`] if `taps` is empty or of even
    /// length.
    pub fn from_taps(taps: Vec<f32>) -> Result<Self, MetricError> {
        if taps.len() % 2 == 0 {
            return Err(MetricError::InvalidKernel {
                reason: format!("kernel length must be odd, got {}", taps.len()),
            });
        }
        Ok(Self { taps })
    }

    /// The taps, from offset `-radius` to `+radius`.
    #[inline]
    #[must_use]
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }

    /// Number of taps on each side of the center.
    #[inline]
    #[must_use]
    pub fn radius(&self) -> usize {
        self.taps.len() / 2
    }

    /// Number of taps, `2 * radius + 1`.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.taps.len()
    }

    /// Always false: kernels have at least one tap.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.taps.is_empty()
    }
}
