//! Separable 2D convolution over planar multi-channel images.
//!
//! The filter runs along rows into a one-plane scratch buffer, then along
//! columns from the scratch into the destination, one channel at a time.
//! Samples that fall off an edge are synthesized with a [`BoundaryExt`].
//!
//! Optimizations:
//! - Row interior (kernel fully inside the row) skips boundary mapping and
//!   processes 8 outputs at a time with `f32x8`
//! - Column pass accumulates whole rows, so every access is sequential
//!
//! Both paths accumulate taps in the same order starting from zero, so the
//! SIMD and scalar results are bit-identical.

use wide::f32x8;

use crate::MetricError;
use crate::boundary::BoundaryExt;
use crate::image::{PlanarImage, check_len, try_zeroed};
use crate::kernel::Kernel;

/// Convolves `src` with `kernel_x` along rows and `kernel_y` along columns.
///
/// `src` and `dst` hold `channels` planes of `width * height` samples each.
/// `scratch` must hold at least one plane; its contents are overwritten.
///
/// # Errors
/// Returns [`MetricError::BufferSize`] if any buffer is too small for the
/// given geometry, or [`MetricError::ChannelCount`] if `channels` is zero.
#[allow(clippy::too_many_arguments)]
pub fn separable_conv2d(
    dst: &mut [f32],
    scratch: &mut [f32],
    src: &[f32],
    kernel_x: &Kernel,
    kernel_y: &Kernel,
    boundary: BoundaryExt,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<(), MetricError> {
    check_len(src, width, height, channels)?;
    check_len(dst, width, height, channels)?;
    let plane_len = width * height;
    let scratch = scratch_plane(scratch, plane_len)?;
    if plane_len == 0 {
        return Ok(());
    }

    for (src_plane, dst_plane) in src
        .chunks_exact(plane_len)
        .zip(dst.chunks_exact_mut(plane_len))
    {
        convolve_rows(src_plane, kernel_x.taps(), boundary, width, height, scratch);
        convolve_columns(scratch, kernel_y.taps(), boundary, width, height, dst_plane);
    }

    Ok(())
}

/// In-place variant of [`separable_conv2d`].
///
/// Each plane is fully row-filtered into `scratch` before any of its samples
/// are overwritten, so the result equals the out-of-place convolution.
///
/// # Errors
/// Returns [`MetricError::BufferSize`] if `data` or `scratch` is too small,
/// or [`MetricError::ChannelCount`] if `channels` is zero.
#[allow(clippy::too_many_arguments)]
pub fn separable_conv2d_inplace(
    data: &mut [f32],
    scratch: &mut [f32],
    kernel_x: &Kernel,
    kernel_y: &Kernel,
    boundary: BoundaryExt,
    width: usize,
    height: usize,
    channels: usize,
) -> Result<(), MetricError> {
    check_len(data, width, height, channels)?;
    let plane_len = width * height;
    let scratch = scratch_plane(scratch, plane_len)?;
    if plane_len == 0 {
        return Ok(());
    }

    for plane in data.chunks_exact_mut(plane_len) {
        convolve_rows(plane, kernel_x.taps(), boundary, width, height, scratch);
        convolve_columns(scratch, kernel_y.taps(), boundary, width, height, plane);
    }

    Ok(())
}

/// Filters every channel of `input` with the same kernel on both axes.
///
/// # Errors
/// Returns [`MetricError::Allocation`] if the output or scratch buffer
/// cannot be allocated, or [`MetricError::ChannelCount`] for an image
/// without channels.
pub fn blur(
    input: &PlanarImage,
    kernel: &Kernel,
    boundary: BoundaryExt,
) -> Result<PlanarImage, MetricError> {
    let (width, height, channels) = (input.width(), input.height(), input.channels());
    let mut scratch = try_zeroed(width * height)?;
    let mut output = try_zeroed(width * height * channels)?;
    separable_conv2d(
        &mut output,
        &mut scratch,
        input.data(),
        kernel,
        kernel,
        boundary,
        width,
        height,
        channels,
    )?;
    PlanarImage::from_vec(output, width, height, channels)
}

fn scratch_plane(scratch: &mut [f32], plane_len: usize) -> Result<&mut [f32], MetricError> {
    let actual = scratch.len();
    scratch
        .get_mut(..plane_len)
        .ok_or(MetricError::BufferSize {
            expected: plane_len,
            actual,
        })
}

/// Horizontal pass over one plane.
fn convolve_rows(
    src: &[f32],
    taps: &[f32],
    boundary: BoundaryExt,
    width: usize,
    height: usize,
    out: &mut [f32],
) {
    let radius = taps.len() / 2;
    let left = radius.min(width);
    let right = width.saturating_sub(radius).max(left);

    for (row_in, row_out) in src
        .chunks_exact(width)
        .zip(out.chunks_exact_mut(width))
        .take(height)
    {
        for x in (0..left).chain(right..width) {
            row_out[x] = convolve_border_sample(row_in, taps, boundary, x);
        }
        if right > left {
            convolve_row_interior(row_in, taps, left, right, row_out);
        }
    }
}

/// One output sample whose kernel footprint leaves the row.
#[inline]
fn convolve_border_sample(row: &[f32], taps: &[f32], boundary: BoundaryExt, x: usize) -> f32 {
    let width = row.len();
    let offset = x as isize - (taps.len() / 2) as isize;
    taps.iter().enumerate().fold(0.0f32, |sum, (j, &k)| {
        sum + row[boundary.extend(offset + j as isize, width)] * k
    })
}

/// SIMD interior convolution for `x` in `[start, end)`.
///
/// Callers guarantee `start >= radius` and `end + radius <= row.len()`.
#[multiversion::multiversion(targets(
    "x86_64+avx512f+avx512bw+avx512cd+avx512dq+avx512vl+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
#[inline]
fn convolve_row_interior(row: &[f32], taps: &[f32], start: usize, end: usize, out: &mut [f32]) {
    let radius = taps.len() / 2;
    let simd_chunks = (end - start) / 8;

    for chunk in 0..simd_chunks {
        let x = start + chunk * 8;
        let d = x - radius;
        let mut sum = f32x8::splat(0.0);

        for (j, &k) in taps.iter().enumerate() {
            let mut lanes = [0.0f32; 8];
            lanes.copy_from_slice(&row[d + j..d + j + 8]);
            sum += f32x8::from(lanes) * f32x8::splat(k);
        }

        out[x..x + 8].copy_from_slice(&sum.to_array());
    }

    // Scalar tail
    for x in start + simd_chunks * 8..end {
        let d = x - radius;
        out[x] = taps
            .iter()
            .enumerate()
            .fold(0.0f32, |sum, (j, &k)| sum + row[d + j] * k);
    }
}

/// Vertical pass: `out` row `y` accumulates scratch rows `y - r ..= y + r`.
fn convolve_columns(
    src: &[f32],
    taps: &[f32],
    boundary: BoundaryExt,
    width: usize,
    height: usize,
    out: &mut [f32],
) {
    let radius = taps.len() / 2;

    for (y, row_out) in out.chunks_exact_mut(width).enumerate().take(height) {
        row_out.fill(0.0);
        let offset = y as isize - radius as isize;
        for (j, &k) in taps.iter().enumerate() {
            let sy = boundary.extend(offset + j as isize, height);
            accumulate_scaled(&src[sy * width..(sy + 1) * width], k, row_out);
        }
    }
}

#[multiversion::multiversion(targets(
    "x86_64+avx+avx2+bmi1+bmi2+cmpxchg16b+f16c+fma+fxsr+lzcnt+movbe+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3+xsave",
    "x86_64+cmpxchg16b+fxsr+popcnt+sse+sse2+sse3+sse4.1+sse4.2+ssse3",
))]
#[inline]
fn accumulate_scaled(src: &[f32], k: f32, out: &mut [f32]) {
    for (o, &s) in out.iter_mut().zip(src) {
        *o += s * k;
    }
}
