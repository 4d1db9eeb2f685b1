//! Luminance to black/white conversion.
//!
//! The adaptive binarizer thresholds each 8x8 block at the mean of the
//! window around it, read from an integral image of block sums. Windows
//! whose standard deviation is below the contrast floor hold no edges, so
//! they fall back to the global Otsu threshold instead of amplifying noise.
use rayon::prelude::*;

use crate::models::{BitMatrix, LuminanceGrid};

const BLOCK_SIZE: usize = 8;

/// Side of the thresholding window: an eighth of the short side, odd,
/// between 15 and 63 pixels.
pub fn window_size(width: usize, height: usize) -> usize {
    (width.min(height) / 8).clamp(15, 63) | 1
}

/// Adaptive binarization. Returns a BitMatrix where true = black.
pub fn adaptive_binarize(grid: &LuminanceGrid, min_contrast: u8) -> BitMatrix {
    let width = grid.width();
    let height = grid.height();
    if width == 0 || height == 0 {
        return BitMatrix::new(width, height);
    }

    let blocks_x = width.div_ceil(BLOCK_SIZE);
    let blocks_y = height.div_ceil(BLOCK_SIZE);

    // per-block sum, sum of squares and pixel count
    let mut sums = vec![[0u64; 3]; blocks_x * blocks_y];
    for y in 0..height {
        let base = (y / BLOCK_SIZE) * blocks_x;
        for (x, &v) in grid.row(y).iter().enumerate() {
            let cell = &mut sums[base + x / BLOCK_SIZE];
            let v = v as u64;
            cell[0] += v;
            cell[1] += v * v;
            cell[2] += 1;
        }
    }

    let stride = blocks_x + 1;
    let mut integral = vec![[0u64; 3]; stride * (blocks_y + 1)];
    for by in 0..blocks_y {
        for bx in 0..blocks_x {
            let i = (by + 1) * stride + bx + 1;
            for k in 0..3 {
                integral[i][k] = sums[by * blocks_x + bx][k] + integral[i - 1][k]
                    + integral[i - stride][k]
                    - integral[i - stride - 1][k];
            }
        }
    }

    let min_std = min_contrast as f64;
    let stats = |cell: [u64; 3]| {
        let n = cell[2] as f64;
        let mean = cell[0] as f64 / n;
        let variance = (cell[1] as f64 / n - mean * mean).max(0.0);
        (mean, variance.sqrt())
    };

    // a page with no contrast anywhere stays white
    let (_, global_std) = stats(integral[blocks_y * stride + blocks_x]);
    let global = if global_std < min_std {
        0
    } else {
        otsu_threshold(grid.data())
    };

    let radius = (window_size(width, height) / 2)
        .div_ceil(BLOCK_SIZE)
        .max(1);
    let thresholds: Vec<u8> = (0..blocks_x * blocks_y)
        .into_par_iter()
        .map(|i| {
            let (bx, by) = (i % blocks_x, i / blocks_x);
            let x0 = bx.saturating_sub(radius);
            let y0 = by.saturating_sub(radius);
            let x1 = (bx + radius + 1).min(blocks_x);
            let y1 = (by + radius + 1).min(blocks_y);
            let rect = |k: usize| {
                integral[y1 * stride + x1][k] + integral[y0 * stride + x0][k]
                    - integral[y0 * stride + x1][k]
                    - integral[y1 * stride + x0][k]
            };
            let (mean, std_dev) = stats([rect(0), rect(1), rect(2)]);
            if std_dev < min_std {
                global
            } else {
                mean.ceil().min(255.0) as u8
            }
        })
        .collect();

    let mut flags = vec![false; width * height];
    flags
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row_flags)| {
            let base = (y / BLOCK_SIZE) * blocks_x;
            for (x, (flag, &v)) in row_flags.iter_mut().zip(grid.row(y)).enumerate() {
                *flag = v < thresholds[base + x / BLOCK_SIZE];
            }
        });

    BitMatrix::from_flags(width, height, &flags)
}

/// Convert grayscale image to binary using Otsu's thresholding method
/// Returns a BitMatrix where true = black, false = white
pub fn otsu_binarize(grid: &LuminanceGrid) -> BitMatrix {
    threshold_binarize(grid, otsu_threshold(grid.data()))
}

/// Pixels strictly below `threshold` become black.
pub fn threshold_binarize(grid: &LuminanceGrid, threshold: u8) -> BitMatrix {
    let flags: Vec<bool> = grid.data().par_iter().map(|&v| v < threshold).collect();
    BitMatrix::from_flags(grid.width(), grid.height(), &flags)
}

/// Otsu's optimal threshold. A single-valued histogram has no split and
/// yields 0, so nothing is black.
pub fn otsu_threshold(gray: &[u8]) -> u8 {
    let mut histogram = [0u64; 256];
    for &pixel in gray {
        histogram[pixel as usize] += 1;
    }

    let total_pixels = gray.len() as f64;
    let total_sum: u64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as u64 * c)
        .sum();

    let mut max_variance = 0.0;
    let mut optimal_threshold = 0u8;
    let mut class1_pixels = 0u64;
    let mut class1_sum = 0u64;

    // threshold t puts intensities < t in class 1
    for threshold in 1..=255usize {
        class1_pixels += histogram[threshold - 1];
        class1_sum += histogram[threshold - 1] * (threshold as u64 - 1);
        let class2_pixels = gray.len() as u64 - class1_pixels;
        if class1_pixels == 0 || class2_pixels == 0 {
            continue;
        }

        let class1_mean = class1_sum as f64 / class1_pixels as f64;
        let class2_mean = (total_sum - class1_sum) as f64 / class2_pixels as f64;
        let weight1 = class1_pixels as f64 / total_pixels;
        let weight2 = class2_pixels as f64 / total_pixels;
        let variance = weight1 * weight2 * (class1_mean - class2_mean).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = threshold as u8;
        }
    }

    optimal_threshold
}
