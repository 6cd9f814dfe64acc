//! Planar image buffers for imdiff.
//!
//! All metrics operate on planar floating-point data: a flat buffer indexed
//! `[channel][row][col]`, with samples nominally in `[0, 1]` (8-bit intensity
//! divided by 255). Filtered and difference buffers may leave that range.

use std::ops::{Index, IndexMut};

use imgref::{ImgRef, ImgVec};
use rgb::RGB8;

use crate::MetricError;

/// Multi-channel planar floating point image.
///
/// Channel `c` occupies `data[c * width * height..(c + 1) * width * height]`,
/// rows are contiguous and unpadded within a plane.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarImage {
    data: Vec<f32>,
    width: usize,
    height: usize,
    channels: usize,
}

impl PlanarImage {
    /// Creates a new image filled with zeros.
    #[must_use]
    pub fn new(width: usize, height: usize, channels: usize) -> Self {
        Self::filled(width, height, channels, 0.0)
    }

    /// Creates an image filled with a constant value.
    #[must_use]
    pub fn filled(width: usize, height: usize, channels: usize, value: f32) -> Self {
        Self {
            data: vec![value; width * height * channels],
            width,
            height,
            channels,
        }
    }

    /// Creates an image from existing planar data.
    ///
    /// # Errors
    /// Returns [`MetricError::ChannelCount`] if `channels` is zero and
    /// [`MetricError::BufferSize`] if `data.len()` is not
    /// `width * height * channels`.
    pub fn from_vec(
        data: Vec<f32>,
        width: usize,
        height: usize,
        channels: usize,
    ) -> Result<Self, MetricError> {
        check_len(&data, width, height, channels)?;
        Ok(Self {
            data,
            width,
            height,
            channels,
        })
    }

    /// Converts interleaved 8-bit RGB into a 3-channel planar image in `[0, 1]`.
    ///
    /// Honors the stride of `img`.
    #[must_use]
    pub fn from_rgb8(img: ImgRef<'_, RGB8>) -> Self {
        let (width, height) = (img.width(), img.height());
        let plane_len = width * height;
        let mut out = Self::new(width, height, 3);

        for (y, row) in img.rows().enumerate() {
            for (x, px) in row.iter().enumerate() {
                let n = y * width + x;
                out.data[n] = f32::from(px.r) / 255.0;
                out.data[plane_len + n] = f32::from(px.g) / 255.0;
                out.data[2 * plane_len + n] = f32::from(px.b) / 255.0;
            }
        }

        out
    }

    /// Quantizes the image to interleaved 8-bit RGB.
    ///
    /// Samples are saturated to `[0, 1]` and rounded. A single-channel image
    /// is written as gray; extra channels beyond the third are ignored.
    ///
    /// # Errors
    /// Returns [`MetricError::ChannelCount`] for images with 0 or 2 channels.
    pub fn to_rgb8(&self) -> Result<ImgVec<RGB8>, MetricError> {
        let plane_len = self.width * self.height;
        let (g_off, b_off) = match self.channels {
            1 => (0, 0),
            c if c >= 3 => (plane_len, 2 * plane_len),
            c => return Err(MetricError::ChannelCount(c)),
        };

        let pixels = (0..plane_len)
            .map(|n| {
                RGB8::new(
                    quantize(self.data[n]),
                    quantize(self.data[g_off + n]),
                    quantize(self.data[b_off + n]),
                )
            })
            .collect();

        Ok(ImgVec::new(pixels, self.width, self.height))
    }

    /// Image width in pixels.
    #[inline]
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Image height in pixels.
    #[inline]
    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of channels (planes).
    #[inline]
    #[must_use]
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Returns one channel plane (`width * height` samples).
    #[inline]
    #[must_use]
    pub fn plane(&self, channel: usize) -> &[f32] {
        let len = self.width * self.height;
        &self.data[channel * len..(channel + 1) * len]
    }

    /// Returns one channel plane mutably.
    #[inline]
    pub fn plane_mut(&mut self, channel: usize) -> &mut [f32] {
        let len = self.width * self.height;
        &mut self.data[channel * len..(channel + 1) * len]
    }

    /// Returns row `y` of `channel`.
    #[inline]
    #[must_use]
    pub fn row(&self, channel: usize, y: usize) -> &[f32] {
        let start = (channel * self.height + y) * self.width;
        &self.data[start..start + self.width]
    }

    /// Returns row `y` of `channel` mutably.
    #[inline]
    pub fn row_mut(&mut self, channel: usize, y: usize) -> &mut [f32] {
        let start = (channel * self.height + y) * self.width;
        &mut self.data[start..start + self.width]
    }

    /// Gets a sample.
    #[inline]
    #[must_use]
    pub fn get(&self, channel: usize, x: usize, y: usize) -> f32 {
        self.data[(channel * self.height + y) * self.width + x]
    }

    /// Sets a sample.
    #[inline]
    pub fn set(&mut self, channel: usize, x: usize, y: usize, value: f32) {
        self.data[(channel * self.height + y) * self.width + x] = value;
    }

    /// Returns the raw planar data.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Returns the raw planar data mutably.
    #[inline]
    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    /// Consumes the image and returns its planar data.
    #[must_use]
    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    /// Checks if two images have the same width and height.
    #[must_use]
    pub fn same_size(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// `(channel, x, y)` indexing.
impl Index<(usize, usize, usize)> for PlanarImage {
    type Output = f32;

    #[inline]
    fn index(&self, (c, x, y): (usize, usize, usize)) -> &Self::Output {
        &self.data[(c * self.height + y) * self.width + x]
    }
}

impl IndexMut<(usize, usize, usize)> for PlanarImage {
    #[inline]
    fn index_mut(&mut self, (c, x, y): (usize, usize, usize)) -> &mut Self::Output {
        &mut self.data[(c * self.height + y) * self.width + x]
    }
}

#[inline]
fn quantize(v: f32) -> u8 {
    if v < 0.0 {
        0
    } else if v > 1.0 {
        255
    } else {
        (255.0 * v + 0.5) as u8
    }
}

/// Verifies that `channels` is non-zero and that `buf` holds exactly
/// `width * height * channels` samples.
pub(crate) fn check_len(
    buf: &[f32],
    width: usize,
    height: usize,
    channels: usize,
) -> Result<(), MetricError> {
    if channels == 0 {
        return Err(MetricError::ChannelCount(0));
    }
    let expected = width * height * channels;
    if buf.len() == expected {
        Ok(())
    } else {
        Err(MetricError::BufferSize {
            expected,
            actual: buf.len(),
        })
    }
}

/// Allocates a zeroed buffer, reporting allocation failure instead of aborting.
pub(crate) fn try_zeroed(len: usize) -> Result<Vec<f32>, MetricError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(len)
        .map_err(|_| MetricError::Allocation { len })?;
    buf.resize(len, 0.0);
    Ok(buf)
}
