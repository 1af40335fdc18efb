//! Image preprocessing for prediction on ordinary picture files.
//!
//! These functions decode image bytes (PNG/JPEG/BMP/GIF), resize them to the
//! network's input dimensions, and normalize pixel values to the [0, 1] range.

use std::path::Path;

use crate::error::{NetError, Result};

/// Decodes image bytes, resizes to `width × height`, converts to grayscale,
/// and normalizes pixels to [0, 1].
///
/// Returns a flat `Vec<f64>` of length `width * height`.
pub fn image_bytes_to_grayscale_input(bytes: &[u8], width: u32, height: u32) -> Result<Vec<f64>> {
    let img = image::load_from_memory(bytes)?;
    let resized = img.resize_exact(width, height, image::imageops::FilterType::Lanczos3);
    let gray = resized.to_luma8();
    Ok(gray.pixels().map(|p| p.0[0] as f64 / 255.0).collect())
}

/// Reads an image file and converts it like `image_bytes_to_grayscale_input`.
pub fn image_file_to_grayscale_input(path: impl AsRef<Path>, width: u32, height: u32) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| NetError::io(path.display().to_string(), e))?;
    image_bytes_to_grayscale_input(&bytes, width, height)
}
