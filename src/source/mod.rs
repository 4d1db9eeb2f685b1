//! Image source adapters
//!
//! Everything the engine reads is first normalized into a
//! [`LuminanceGrid`](crate::models::LuminanceGrid):
//! - interleaved pixel buffers in any [`PixelLayout`]
//! - decoded `image::DynamicImage`s
//! - encoded image bytes and base64 text (through [`loader`])

/// Pixel layout normalization (RGB/BGR/alpha to luminance)
pub mod grayscale;
/// Encoded image and base64 loading
pub mod loader;

pub use grayscale::PixelLayout;
pub use loader::{decode_base64, load_base64_image, load_image};
