//! Deterministic synthetic images for imdiff tests.
//!
//! Everything is driven by an LCG so inputs are identical across platforms.

#![allow(dead_code)]

use imdiff::RGB8;

/// Convert RGB byte slice to Vec<RGB8>
pub fn rgb_bytes_to_pixels(rgb: &[u8]) -> Vec<RGB8> {
    rgb.chunks_exact(3)
        .map(|c| RGB8::new(c[0], c[1], c[2]))
        .collect()
}

// ============================================================================
// LCG PRNG
// ============================================================================

/// LCG pseudo-random number generator (deterministic)
pub struct Lcg {
    state: u64,
}

impl Lcg {
    pub const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u8(&mut self) -> u8 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((self.state >> 33) & 0xFF) as u8
    }

    /// Uniform sample in `[0, 1]` on the 8-bit grid.
    pub fn next_unit(&mut self) -> f32 {
        f32::from(self.next_u8()) / 255.0
    }

    /// Uniform sample in `[-amplitude, amplitude]`.
    pub fn next_signed(&mut self, amplitude: f32) -> f32 {
        (f32::from(self.next_u8()) / 127.5 - 1.0) * amplitude
    }
}

// ============================================================================
// Planar generators (samples in [0, 1])
// ============================================================================

/// Uniform noise image.
pub fn gen_noise(width: usize, height: usize, channels: usize, seed: u64) -> Vec<f32> {
    let mut rng = Lcg::new(seed);
    (0..width * height * channels)
        .map(|_| rng.next_unit())
        .collect()
}

/// Smooth diagonal gradient, with a per-channel phase.
pub fn gen_gradient(width: usize, height: usize, channels: usize) -> Vec<f32> {
    let max_dist = (width + height).saturating_sub(2).max(1) as f32;
    let mut data = Vec::with_capacity(width * height * channels);
    for c in 0..channels {
        for y in 0..height {
            for x in 0..width {
                let t = (x + y) as f32 / max_dist;
                data.push((t + 0.25 * c as f32) % 1.0);
            }
        }
    }
    data
}

/// Checkerboard of `cell`-sized squares alternating between `lo` and `hi`.
pub fn gen_checkerboard(
    width: usize,
    height: usize,
    channels: usize,
    cell: usize,
    lo: f32,
    hi: f32,
) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height * channels);
    for _ in 0..channels {
        for y in 0..height {
            for x in 0..width {
                data.push(if (x / cell + y / cell) % 2 == 0 { lo } else { hi });
            }
        }
    }
    data
}

// ============================================================================
// Distortions
// ============================================================================

/// Adds a constant offset to every sample.
pub fn distort_offset(data: &[f32], delta: f32) -> Vec<f32> {
    data.iter().map(|v| v + delta).collect()
}

/// Adds uniform noise of the given amplitude, clamped to `[0, 1]`.
pub fn distort_noise(data: &[f32], amplitude: f32, seed: u64) -> Vec<f32> {
    let mut rng = Lcg::new(seed);
    data.iter()
        .map(|v| (v + rng.next_signed(amplitude)).clamp(0.0, 1.0))
        .collect()
}

/// Replaces the outer `border` pixels of every channel with `value`.
pub fn distort_border(
    data: &[f32],
    width: usize,
    height: usize,
    border: usize,
    value: f32,
) -> Vec<f32> {
    let mut out = data.to_vec();
    for (n, v) in out.iter_mut().enumerate() {
        let (x, y) = (n % width, (n / width) % height);
        if x < border || y < border || x >= width - border || y >= height - border {
            *v = value;
        }
    }
    out
}
