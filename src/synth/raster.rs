//! Painting module patterns into luminance grids and images.

use std::io::Cursor;

use image::{DynamicImage, Rgba, RgbaImage};

use crate::error::Result;
use crate::models::{BitMatrix, LuminanceGrid};

/// Light modules left and right of a linear symbol.
pub const LINEAR_QUIET_MODULES: usize = 10;

const DARK: u8 = 0;
const LIGHT: u8 = 255;

/// Paint bar/space widths (in modules, bar first) at `scale` pixels per
/// module, `bar_height` pixels tall, inside a quiet zone of
/// [`LINEAR_QUIET_MODULES`] on both sides and four modules above and below.
pub fn render_runs(runs: &[u32], scale: usize, bar_height: usize) -> LuminanceGrid {
    let scale = scale.max(1);
    let modules: usize = runs.iter().map(|&w| w as usize).sum();
    let width = (modules + 2 * LINEAR_QUIET_MODULES) * scale;
    let margin = 4 * scale;
    let height = bar_height.max(1) + 2 * margin;

    let mut grid = LuminanceGrid::filled(width, height, LIGHT);
    let mut row = vec![LIGHT; width];
    let mut x = LINEAR_QUIET_MODULES * scale;
    for (i, &w) in runs.iter().enumerate() {
        let span = w as usize * scale;
        if i % 2 == 0 {
            row[x..x + span].fill(DARK);
        }
        x += span;
    }
    for chunk in grid.data_mut().chunks_mut(width).skip(margin).take(bar_height.max(1)) {
        chunk.copy_from_slice(&row);
    }
    grid
}

/// Paint a module grid at `scale` pixels per module with a `quiet` module
/// margin.
pub fn render_matrix(modules: &BitMatrix, scale: usize, quiet: usize) -> LuminanceGrid {
    let scale = scale.max(1);
    let width = (modules.width() + 2 * quiet) * scale;
    let height = (modules.height() + 2 * quiet) * scale;
    let mut grid = LuminanceGrid::filled(width, height, LIGHT);
    let data = grid.data_mut();
    for y in 0..height {
        for x in 0..width {
            let (mx, my) = (x / scale, y / scale);
            let dark = mx >= quiet
                && my >= quiet
                && modules.get(mx - quiet, my - quiet);
            if dark {
                data[y * width + x] = DARK;
            }
        }
    }
    grid
}

/// An opaque RGBA image of `grid`, gray in every channel.
pub fn to_rgba_image(grid: &LuminanceGrid) -> DynamicImage {
    let image = RgbaImage::from_fn(grid.width() as u32, grid.height() as u32, |x, y| {
        let v = grid.get(x as usize, y as usize);
        Rgba([v, v, v, 255])
    });
    DynamicImage::ImageRgba8(image)
}

/// PNG-encode `image`.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, image::ImageOutputFormat::Png)?;
    Ok(out.into_inner())
}
