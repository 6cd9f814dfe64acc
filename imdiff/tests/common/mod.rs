//! Common test utilities for imdiff integration tests.

pub mod generators;

use imdiff::PlanarImage;

/// Asserts two floats agree within `tol`, naming the quantity on failure.
#[track_caller]
pub fn assert_close(actual: f64, expected: f64, tol: f64, what: &str) {
    assert!(
        (actual - expected).abs() <= tol,
        "{what}: got {actual}, expected {expected} (tol {tol})"
    );
}

/// Planar image from an interleaved RGB byte buffer.
#[allow(dead_code)]
pub fn planar_from_rgb_bytes(rgb: &[u8], width: usize, height: usize) -> PlanarImage {
    let pixels = generators::rgb_bytes_to_pixels(rgb);
    PlanarImage::from_rgb8(imdiff::Img::new(pixels, width, height).as_ref())
}
