//! Visualized difference images.
//!
//! `A ← (A - B) / (2D / 255) + 0.5`: identical samples land on mid-gray and a
//! difference of ±D (on the 0..255 scale) reaches black or white. Nothing is
//! clamped here; saturation happens when the buffer is quantized for output
//! (see [`PlanarImage::to_rgb8`](crate::PlanarImage::to_rgb8)).

use crate::MetricError;
use crate::image::check_len;

/// Default `D` parameter.
pub const DEFAULT_DIFFERENCE_SCALE: f32 = 20.0;

/// Divisor `2D / 255` for a given `D`.
///
/// Rejects any `d` whose divisor is not a normal float, so a subnormal `D`
/// cannot turn every difference into an infinity.
pub(crate) fn difference_divisor(d: f32) -> Result<f32, MetricError> {
    let scale = (2.0 * d) / 255.0;
    if d.is_finite() && d > 0.0 && scale.is_normal() {
        Ok(scale)
    } else {
        Err(MetricError::InvalidScale(d))
    }
}

/// Overwrites `a` with the difference image of `a` and `b`.
///
/// # Errors
/// - [`MetricError::InvalidScale`] if `d` is not positive or `2D / 255` is
///   not a normal float.
/// - [`MetricError::BufferSize`] if a buffer does not match the geometry.
/// - [`MetricError::ChannelCount`] if `channels` is zero.
pub fn make_difference_image(
    a: &mut [f32],
    b: &[f32],
    width: usize,
    height: usize,
    channels: usize,
    d: f32,
) -> Result<(), MetricError> {
    let scale = difference_divisor(d)?;
    check_len(a, width, height, channels)?;
    check_len(b, width, height, channels)?;

    for (va, &vb) in a.iter_mut().zip(b) {
        *va = (*va - vb) / scale + 0.5;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_is_mid_gray() {
        for d in [0.5f32, 1.0, 20.0, 255.0] {
            let b: Vec<f32> = (0..24).map(|n| n as f32 / 23.0).collect();
            let mut a = b.clone();
            make_difference_image(&mut a, &b, 4, 2, 3, d).unwrap();
            assert!(a.iter().all(|&v| v == 0.5), "d = {d}");
        }
    }

    #[test]
    fn test_difference_of_d_reaches_extremes() {
        let d = 20.0f32;
        let mut a = vec![0.5 + d / 255.0, 0.5 - d / 255.0, 0.5];
        let b = vec![0.5f32; 3];
        make_difference_image(&mut a, &b, 3, 1, 1, d).unwrap();
        assert!((a[0] - 1.0).abs() < 1e-5);
        assert!(a[1].abs() < 1e-5);
        assert_eq!(a[2], 0.5);
    }

    #[test]
    fn test_no_clamping() {
        let mut a = vec![1.0f32];
        let b = vec![0.0f32];
        make_difference_image(&mut a, &b, 1, 1, 1, 20.0).unwrap();
        assert!((a[0] - (255.0 / 40.0 + 0.5)).abs() < 1e-4);
    }

    #[test]
    fn test_rejects_bad_scale() {
        let mut a = vec![0.0f32; 4];
        let b = vec![0.0f32; 4];
        for d in [0.0f32, -1.0, f32::NAN, f32::INFINITY, 1e-40, f32::MAX] {
            assert!(
                matches!(
                    make_difference_image(&mut a, &b, 2, 2, 1, d),
                    Err(MetricError::InvalidScale(_))
                ),
                "d = {d}"
            );
        }
        assert_eq!(a, vec![0.0f32; 4]);
    }

    #[test]
    fn test_tiny_scale_stays_finite() {
        // Smallest D whose divisor is still normal
        let d = f32::MIN_POSITIVE * 255.0;
        let mut a = vec![0.5f32, 0.5 + f32::EPSILON];
        let b = vec![0.5f32; 2];
        make_difference_image(&mut a, &b, 2, 1, 1, d).unwrap();
        assert_eq!(a[0], 0.5);
        assert!(a[1].is_finite() && a[1] > 0.5, "{}", a[1]);
    }

    #[test]
    fn test_rejects_zero_channels() {
        let mut a: Vec<f32> = Vec::new();
        assert_eq!(
            make_difference_image(&mut a, &[], 4, 4, 0, 20.0),
            Err(MetricError::ChannelCount(0))
        );
    }

    #[test]
    fn test_rejects_wrong_length() {
        let mut a = vec![0.0f32; 4];
        let b = vec![0.0f32; 3];
        assert!(matches!(
            make_difference_image(&mut a, &b, 2, 2, 1, 20.0),
            Err(MetricError::BufferSize { .. })
        ));
    }
}
