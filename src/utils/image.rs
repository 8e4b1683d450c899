//! Utility functions for image decoding.

use crate::core::errors::{VerifyError, VerifyResult};
use image::DynamicImage;

/// Decodes an uploaded image from memory, guessing the format from its bytes.
///
/// # Errors
///
/// Returns `VerifyError::InvalidInput` for an empty upload and
/// `VerifyError::Decode` when the bytes are not a supported raster format.
pub fn decode_image(bytes: &[u8]) -> VerifyResult<DynamicImage> {
    if bytes.is_empty() {
        return Err(VerifyError::invalid_input("uploaded image is empty"));
    }

    let image = image::load_from_memory(bytes)?;
    if image.width() == 0 || image.height() == 0 {
        return Err(VerifyError::invalid_input("image has no pixels"));
    }
    Ok(image)
}

/// Reads an image file into memory without decoding it.
pub fn load_image_bytes(path: &std::path::Path) -> VerifyResult<Vec<u8>> {
    Ok(std::fs::read(path)?)
}
