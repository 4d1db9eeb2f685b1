//! Pixel buffer to luminance conversion.
//!
//! Y = 0.299*R + 0.587*G + 0.114*B in fast integer form:
//! Y = (76*R + 150*G + 29*B) >> 8. Alpha is composited over white so a
//! transparent background reads as paper. Buffers of at least
//! [`PARALLEL_MIN_PIXELS`] pixels are converted row-parallel.

use image::{DynamicImage, GrayImage, Luma};
use rayon::prelude::*;

use crate::error::{DecodeError, Result};
use crate::models::LuminanceGrid;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

/// Below this many pixels rows are converted on the calling thread.
pub const PARALLEL_MIN_PIXELS: usize = 256 * 256;

/// Channel order of an interleaved 8-bit pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelLayout {
    /// One gray byte per pixel
    Luma8,
    /// Gray then alpha
    LumaA8,
    /// Red, green, blue
    Rgb8,
    /// Red, green, blue, alpha
    Rgba8,
    /// Blue, green, red
    Bgr8,
    /// Blue, green, red, alpha
    Bgra8,
}

impl PixelLayout {
    /// Bytes per pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Luma8 => 1,
            PixelLayout::LumaA8 => 2,
            PixelLayout::Rgb8 | PixelLayout::Bgr8 => 3,
            PixelLayout::Rgba8 | PixelLayout::Bgra8 => 4,
        }
    }

    fn luminance(self, px: &[u8]) -> u8 {
        match self {
            PixelLayout::Luma8 => px[0],
            PixelLayout::LumaA8 => over_white(px[0], px[1]),
            PixelLayout::Rgb8 => luma(px[0], px[1], px[2]),
            PixelLayout::Bgr8 => luma(px[2], px[1], px[0]),
            PixelLayout::Rgba8 => over_white(luma(px[0], px[1], px[2]), px[3]),
            PixelLayout::Bgra8 => over_white(luma(px[2], px[1], px[0]), px[3]),
        }
    }
}

#[inline]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

#[inline]
fn over_white(y: u8, alpha: u8) -> u8 {
    let a = alpha as u32;
    ((y as u32 * a + 255 * (255 - a) + 127) / 255) as u8
}

fn convert_row(layout: PixelLayout, out: &mut [u8], src: &[u8]) {
    for (o, px) in out.iter_mut().zip(src.chunks_exact(layout.bytes_per_pixel())) {
        *o = layout.luminance(px);
    }
}

impl LuminanceGrid {
    /// Normalize an interleaved pixel buffer.
    ///
    /// Fails with an input error on zero dimensions or when the buffer
    /// length is not `width * height * bytes_per_pixel`.
    pub fn from_pixels(pixels: &[u8], width: usize, height: usize, layout: PixelLayout) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(DecodeError::invalid_input(format!(
                "image has no pixels ({width}x{height})"
            )));
        }
        let bpp = layout.bytes_per_pixel();
        let expected = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(bpp))
            .ok_or_else(|| DecodeError::invalid_input("image dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(DecodeError::invalid_input(format!(
                "pixel buffer holds {} bytes, expected {expected} for {width}x{height} {layout:?}",
                pixels.len()
            )));
        }

        if layout == PixelLayout::Luma8 {
            return LuminanceGrid::new(width, height, pixels.to_vec());
        }

        let mut gray = vec![0u8; width * height];
        if width * height >= PARALLEL_MIN_PIXELS {
            gray.par_chunks_mut(width)
                .zip(pixels.par_chunks(width * bpp))
                .for_each(|(out, src)| convert_row(layout, out, src));
        } else {
            gray.chunks_mut(width)
                .zip(pixels.chunks(width * bpp))
                .for_each(|(out, src)| convert_row(layout, out, src));
        }
        LuminanceGrid::new(width, height, gray)
    }

    /// Normalize a decoded image. 16-bit and float images go through RGBA8.
    pub fn from_image(image: &DynamicImage) -> Result<Self> {
        let (width, height) = (image.width() as usize, image.height() as usize);
        match image {
            DynamicImage::ImageLuma8(buf) => Self::from_pixels(buf.as_raw(), width, height, PixelLayout::Luma8),
            DynamicImage::ImageLumaA8(buf) => Self::from_pixels(buf.as_raw(), width, height, PixelLayout::LumaA8),
            DynamicImage::ImageRgb8(buf) => Self::from_pixels(buf.as_raw(), width, height, PixelLayout::Rgb8),
            DynamicImage::ImageRgba8(buf) => Self::from_pixels(buf.as_raw(), width, height, PixelLayout::Rgba8),
            other => Self::from_pixels(other.to_rgba8().as_raw(), width, height, PixelLayout::Rgba8),
        }
    }

    /// An 8-bit gray image of the grid.
    pub fn to_image(&self) -> DynamicImage {
        let image = GrayImage::from_fn(self.width() as u32, self.height() as u32, |x, y| {
            Luma([self.get(x as usize, y as usize)])
        });
        DynamicImage::ImageLuma8(image)
    }
}
