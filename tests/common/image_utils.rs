//! Image inspection utilities for testing.

use image::{DynamicImage, GenericImageView, ImageError, ImageFormat, RgbaImage};
use std::path::Path;

pub const WHITE: [u8; 4] = [255, 255, 255, 255];

/// Load an image from a file
pub fn load_image(path: &Path) -> Result<DynamicImage, ImageError> {
    image::open(path)
}

/// Load an image from a byte array
pub fn load_image_from_bytes(bytes: &[u8]) -> Result<DynamicImage, ImageError> {
    image::load_from_memory(bytes)
}

/// Detect image format from bytes
pub fn detect_image_format(bytes: &[u8]) -> Option<ImageFormat> {
    image::guess_format(bytes).ok()
}

/// Check if an image has the expected dimensions
pub fn assert_image_dimensions(
    image: &DynamicImage,
    expected_width: u32,
    expected_height: u32,
) -> Result<(), String> {
    let (actual_width, actual_height) = image.dimensions();

    if actual_width != expected_width || actual_height != expected_height {
        return Err(format!(
            "Image dimensions differ: actual = {}x{}, expected = {}x{}",
            actual_width, actual_height, expected_width, expected_height
        ));
    }

    Ok(())
}

/// Number of pixels that are not pure white
pub fn count_drawn_pixels(image: &RgbaImage) -> usize {
    image.pixels().filter(|p| p.0 != WHITE).count()
}

/// Number of pixels of exactly `color`
pub fn count_color(image: &RgbaImage, color: [u8; 4]) -> usize {
    image.pixels().filter(|p| p.0 == color).count()
}
