//! Run-length sampling along a scan line for linear candidates.

use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, Point};

/// Sample the segment `start..end` at one-pixel steps and return its run
/// lengths, beginning with the first dark run. Each step is a majority of
/// the point and its two perpendicular neighbours. Trailing light pixels
/// are dropped.
pub fn sample_line(matrix: &BitMatrix, start: Point, end: Point) -> Result<Vec<u32>> {
    let width = matrix.width() as f32;
    let height = matrix.height() as f32;
    for p in [start, end] {
        if !(p.x >= 0.0 && p.y >= 0.0 && p.x <= width && p.y <= height) {
            return Err(DecodeError::geometry(format!(
                "scan line endpoint ({:.1}, {:.1}) lies outside the {}x{} bitmap",
                p.x,
                p.y,
                matrix.width(),
                matrix.height()
            )));
        }
    }

    let length = start.distance(&end);
    let steps = length.round() as usize;
    if steps == 0 {
        return Err(DecodeError::geometry("scan line has zero length"));
    }
    let (ux, uy) = ((end.x - start.x) / length, (end.y - start.y) / length);
    // unit normal
    let (nx, ny) = (-uy, ux);

    let mut runs: Vec<u32> = Vec::new();
    let mut current = false;
    for k in 0..steps {
        let t = k as f32 + 0.5;
        let p = Point::new(start.x + ux * t, start.y + uy * t);
        let votes = [-1.0f32, 0.0, 1.0]
            .iter()
            .filter(|&&s| dark_at(matrix, p.x + nx * s, p.y + ny * s))
            .count();
        let dark = votes >= 2;

        if runs.is_empty() {
            if dark {
                runs.push(1);
                current = true;
            }
        } else if dark == current {
            if let Some(last) = runs.last_mut() {
                *last += 1;
            }
        } else {
            runs.push(1);
            current = dark;
        }
    }

    if !current {
        runs.pop();
    }
    Ok(runs)
}

fn dark_at(matrix: &BitMatrix, x: f32, y: f32) -> bool {
    x >= 0.0 && y >= 0.0 && matrix.get(x as usize, y as usize)
}
