//! Image to model input conversion for the companion client.
//!
//! A 28x28 PNG is converted to greyscale and flattened row-major, with each
//! pixel normalized to `[0, 1]`.

use thiserror::Error;

use crate::prediction::types::IMAGE_SIZE;

/// Side length of the square input images the model expects.
pub const IMAGE_SIDE: u32 = 28;

#[derive(Debug, Error)]
pub enum ImageInputError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),

    #[error("image must be 28x28 pixels, got {width}x{height}")]
    WrongSize { width: u32, height: u32 },
}

/// Decode an encoded image and return the 784-value model input.
pub fn decode_input_vector(data: &[u8]) -> Result<Vec<f32>, ImageInputError> {
    let decoded = image::load_from_memory(data)?;
    if decoded.width() != IMAGE_SIDE || decoded.height() != IMAGE_SIDE {
        return Err(ImageInputError::WrongSize {
            width: decoded.width(),
            height: decoded.height(),
        });
    }

    let gray = decoded.to_luma16();
    let pixels: Vec<f32> = gray
        .pixels()
        .map(|p| f32::from(p.0[0]) / f32::from(u16::MAX))
        .collect();
    debug_assert_eq!(pixels.len(), IMAGE_SIZE);
    Ok(pixels)
}
