//! Encoded image loading: raw file bytes and base64 text.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;

use crate::error::{DecodeError, Result};

/// Decode an encoded image (PNG, JPEG, GIF, BMP, ...) from memory.
pub fn load_image(bytes: &[u8]) -> Result<DynamicImage> {
    if bytes.is_empty() {
        return Err(DecodeError::invalid_input("image data is empty"));
    }
    Ok(image::load_from_memory(bytes)?)
}

/// Decode base64 text into bytes.
///
/// Everything up to and including the first `,` is dropped so data URIs
/// (`data:image/png;base64,...`) work as is. ASCII whitespace anywhere in
/// the payload is ignored.
pub fn decode_base64(text: &str) -> Result<Vec<u8>> {
    let payload = match text.find(',') {
        Some(comma) => &text[comma + 1..],
        None => text,
    };
    let compact: String = payload
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect();
    if compact.is_empty() {
        return Err(DecodeError::invalid_input("base64 payload is empty"));
    }
    Ok(STANDARD.decode(compact)?)
}

/// Decode base64 text and then the image it carries.
pub fn load_base64_image(text: &str) -> Result<DynamicImage> {
    load_image(&decode_base64(text)?)
}
