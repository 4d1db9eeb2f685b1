//! Perspective transforms between module space and pixel space

use crate::error::{DecodeError, Result};
use crate::models::Point;

/// Below this the transform is treated as collapsed.
const MIN_DETERMINANT: f64 = 1e-9;

/// Perspective transformation matrix (3x3), solved in f64
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    a11: f64,
    a12: f64,
    a13: f64,
    a21: f64,
    a22: f64,
    a23: f64,
    a31: f64,
    a32: f64,
    a33: f64,
}

impl PerspectiveTransform {
    /// Create transform from 4 source points to 4 destination points.
    ///
    /// Fails with a geometry error when the system is singular or the
    /// result collapses or mirrors the plane (determinant not positive).
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Result<Self> {
        // direct linear transform with a33 fixed to 1
        let mut a = [[0.0f64; 8]; 8];
        let mut b = [0.0f64; 8];

        for i in 0..4 {
            let (sx, sy) = (src[i].x as f64, src[i].y as f64);
            let (dx, dy) = (dst[i].x as f64, dst[i].y as f64);

            let row = i * 2;
            a[row] = [sx, sy, 1.0, 0.0, 0.0, 0.0, -dx * sx, -dx * sy];
            b[row] = dx;
            a[row + 1] = [0.0, 0.0, 0.0, sx, sy, 1.0, -dy * sx, -dy * sy];
            b[row + 1] = dy;
        }

        let s = solve_linear_system(&a, &b)
            .ok_or_else(|| DecodeError::geometry("singular perspective system"))?;
        let transform = Self {
            a11: s[0],
            a12: s[1],
            a13: s[2],
            a21: s[3],
            a22: s[4],
            a23: s[5],
            a31: s[6],
            a32: s[7],
            a33: 1.0,
        };

        let det = transform.determinant();
        if !det.is_finite() || det <= MIN_DETERMINANT {
            return Err(DecodeError::geometry(format!(
                "transform determinant {det:.3e} is not positive"
            )));
        }
        Ok(transform)
    }

    /// Determinant of the 3x3 matrix.
    pub fn determinant(&self) -> f64 {
        self.a11 * (self.a22 * self.a33 - self.a23 * self.a32)
            - self.a12 * (self.a21 * self.a33 - self.a23 * self.a31)
            + self.a13 * (self.a21 * self.a32 - self.a22 * self.a31)
    }

    /// Transform a point; `None` when it maps to infinity.
    pub fn transform(&self, p: &Point) -> Option<Point> {
        let x = p.x as f64;
        let y = p.y as f64;

        let denominator = self.a31 * x + self.a32 * y + self.a33;
        if denominator.abs() < 1e-12 {
            return None;
        }

        let x_new = (self.a11 * x + self.a12 * y + self.a13) / denominator;
        let y_new = (self.a21 * x + self.a22 * y + self.a23) / denominator;

        Some(Point::new(x_new as f32, y_new as f32))
    }
}

/// Solve 8x8 linear system using Gaussian elimination with partial pivoting
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(a: &[[f64; 8]; 8], b: &[f64; 8]) -> Option<[f64; 8]> {
    let mut a = *a;
    let mut b = *b;
    let n = 8;

    for i in 0..n {
        let mut max_val = a[i][i].abs();
        let mut max_row = i;
        for k in (i + 1)..n {
            if a[k][i].abs() > max_val {
                max_val = a[k][i].abs();
                max_row = k;
            }
        }

        if max_val < 1e-12 {
            return None;
        }

        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    let mut x = [0.0f64; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }

    Some(x)
}
