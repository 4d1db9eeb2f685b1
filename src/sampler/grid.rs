//! Module grid sampling for matrix candidates.
//!
//! Module space puts the finder centers 3.5 modules in from the symbol
//! edges. The fourth correspondence is the parallelogram completion of the
//! three finders, or the bottom-right alignment pattern once it is found.

use crate::decoder::qr::function_mask::alignment_pattern_centers;
use crate::decoder::qr::version_for_dimension;
use crate::error::{DecodeError, Result};
use crate::models::{BitMatrix, Point};
use crate::utils::geometry::PerspectiveTransform;

/// Symbol corners may overshoot the bitmap by this many pixels.
const EDGE_SLACK: f32 = 1.0;
/// Alignment checks with more wrong cells than this are rejected.
const MAX_ALIGNMENT_MISMATCH: usize = 8;

/// Samples one matrix candidate at a fixed dimension.
pub struct GridSampler<'a> {
    matrix: &'a BitMatrix,
    top_left: Point,
    top_right: Point,
    bottom_left: Point,
    dimension: usize,
    module_size: f32,
    transform: PerspectiveTransform,
}

impl<'a> GridSampler<'a> {
    /// Build the parallelogram transform and check that the whole symbol
    /// lands inside the bitmap.
    pub fn new(
        matrix: &'a BitMatrix,
        top_left: Point,
        top_right: Point,
        bottom_left: Point,
        dimension: usize,
        module_size: f32,
    ) -> Result<Self> {
        if dimension < 21 {
            return Err(DecodeError::geometry(format!(
                "dimension {dimension} is too small for a matrix symbol"
            )));
        }
        let bottom_right = Point::new(
            top_right.x + bottom_left.x - top_left.x,
            top_right.y + bottom_left.y - top_left.y,
        );
        let src = finder_sources(dimension, Point::new(dimension as f32 - 3.5, dimension as f32 - 3.5));
        let dst = [top_left, top_right, bottom_left, bottom_right];
        let transform = PerspectiveTransform::from_points(&src, &dst)?;
        check_inside(matrix, &transform, dimension)?;

        Ok(Self {
            matrix,
            top_left,
            top_right,
            bottom_left,
            dimension,
            module_size,
            transform,
        })
    }

    /// Sample with the parallelogram transform.
    pub fn sample(&self) -> BitMatrix {
        sample_with(self.matrix, &self.transform, self.dimension, self.module_size)
    }

    /// Sample again with the bottom-right corner pinned to the located
    /// alignment pattern. `None` for version 1 or when no alignment pattern
    /// is found near its predicted position.
    pub fn refined(&self) -> Option<BitMatrix> {
        let version = version_for_dimension(self.dimension)?;
        let (ax, ay) = alignment_pattern_centers(version)
            .into_iter()
            .max_by_key(|&(x, y)| x + y)?;
        let align_src = Point::new(ax as f32 + 0.5, ay as f32 + 0.5);
        let predicted = self.transform.transform(&align_src)?;
        let found = find_alignment_center(self.matrix, predicted, self.module_size)?;

        let src = finder_sources(self.dimension, align_src);
        let dst = [self.top_left, self.top_right, self.bottom_left, found];
        let transform = PerspectiveTransform::from_points(&src, &dst).ok()?;
        check_inside(self.matrix, &transform, self.dimension).ok()?;
        Some(sample_with(
            self.matrix,
            &transform,
            self.dimension,
            self.module_size,
        ))
    }
}

fn finder_sources(dimension: usize, fourth: Point) -> [Point; 4] {
    let far = dimension as f32 - 3.5;
    [
        Point::new(3.5, 3.5),
        Point::new(far, 3.5),
        Point::new(3.5, far),
        fourth,
    ]
}

fn check_inside(matrix: &BitMatrix, transform: &PerspectiveTransform, dimension: usize) -> Result<()> {
    let d = dimension as f32;
    let max_x = matrix.width() as f32 + EDGE_SLACK;
    let max_y = matrix.height() as f32 + EDGE_SLACK;
    for corner in [
        Point::new(0.0, 0.0),
        Point::new(d, 0.0),
        Point::new(0.0, d),
        Point::new(d, d),
    ] {
        let p = transform
            .transform(&corner)
            .ok_or_else(|| DecodeError::geometry("symbol corner maps to infinity"))?;
        if !(p.x >= -EDGE_SLACK && p.y >= -EDGE_SLACK && p.x <= max_x && p.y <= max_y) {
            return Err(DecodeError::geometry(format!(
                "symbol corner ({:.1}, {:.1}) lies outside the {}x{} bitmap",
                p.x,
                p.y,
                matrix.width(),
                matrix.height()
            )));
        }
    }
    Ok(())
}

/// Majority vote of a 3x3 neighbourhood around each module center, spread
/// over the middle half of the module.
fn sample_with(
    matrix: &BitMatrix,
    transform: &PerspectiveTransform,
    dimension: usize,
    module_size: f32,
) -> BitMatrix {
    let offset = (module_size * 0.25).floor().max(0.0) as isize;
    let width = matrix.width() as isize;
    let height = matrix.height() as isize;
    let mut result = BitMatrix::new(dimension, dimension);

    for y in 0..dimension {
        for x in 0..dimension {
            let Some(p) = transform.transform(&Point::new(x as f32 + 0.5, y as f32 + 0.5)) else {
                continue;
            };
            let (cx, cy) = (p.x.floor() as isize, p.y.floor() as isize);

            let mut total = 0;
            let mut dark = 0;
            for dy in -1..=1 {
                for dx in -1..=1 {
                    let sx = cx + dx * offset;
                    let sy = cy + dy * offset;
                    if sx >= 0 && sy >= 0 && sx < width && sy < height {
                        total += 1;
                        if matrix.get(sx as usize, sy as usize) {
                            dark += 1;
                        }
                    }
                }
            }
            if total > 0 {
                result.set(x, y, dark * 2 > total);
            }
        }
    }

    result
}

fn find_alignment_center(matrix: &BitMatrix, predicted: Point, module_size: f32) -> Option<Point> {
    if !predicted.x.is_finite() || !predicted.y.is_finite() || module_size < 1.0 {
        return None;
    }

    let radius = (module_size * 4.0).max(4.0);
    let max_x = matrix.width().saturating_sub(1) as f32;
    let max_y = matrix.height().saturating_sub(1) as f32;
    let min_x = (predicted.x - radius).floor().max(0.0) as usize;
    let end_x = (predicted.x + radius).ceil().min(max_x) as usize;
    let min_y = (predicted.y - radius).floor().max(0.0) as usize;
    let end_y = (predicted.y + radius).ceil().min(max_y) as usize;

    let mut best: Option<(Point, usize, f32)> = None;
    for y in min_y..=end_y {
        for x in min_x..=end_x {
            let center = Point::new(x as f32 + 0.5, y as f32 + 0.5);
            let Some(mismatch) = alignment_mismatch(matrix, &center, module_size) else {
                continue;
            };
            let distance = center.distance_squared(&predicted);
            let better = match best {
                None => true,
                Some((_, m, d)) => mismatch < m || (mismatch == m && distance < d),
            };
            if better {
                best = Some((center, mismatch, distance));
            }
        }
    }

    best.filter(|(_, mismatch, _)| *mismatch <= MAX_ALIGNMENT_MISMATCH)
        .map(|(center, _, _)| center)
}

/// Wrong cells when the 5x5 alignment pattern is laid over `center`.
fn alignment_mismatch(matrix: &BitMatrix, center: &Point, module_size: f32) -> Option<usize> {
    let mut mismatches = 0;
    for dy in -2i32..=2 {
        for dx in -2i32..=2 {
            let expected = dx.abs() == 2 || dy.abs() == 2 || (dx == 0 && dy == 0);
            let sx = (center.x + dx as f32 * module_size).floor();
            let sy = (center.y + dy as f32 * module_size).floor();
            if sx < 0.0 || sy < 0.0 || sx as usize >= matrix.width() || sy as usize >= matrix.height() {
                return None;
            }
            if matrix.get(sx as usize, sy as usize) != expected {
                mismatches += 1;
            }
        }
    }
    Some(mismatches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::qr::QrBuilder;

    /// Paint `modules` at `scale` pixels per module with a `quiet` margin.
    fn render(modules: &BitMatrix, scale: usize, quiet: usize) -> BitMatrix {
        let side = (modules.width() + 2 * quiet) * scale;
        let mut out = BitMatrix::new(side, side);
        for y in 0..modules.height() {
            for x in 0..modules.width() {
                if !modules.get(x, y) {
                    continue;
                }
                for py in 0..scale {
                    for px in 0..scale {
                        out.set((x + quiet) * scale + px, (y + quiet) * scale + py, true);
                    }
                }
            }
        }
        out
    }

    fn finder_centers(quiet: usize, scale: usize, dim: usize) -> (Point, Point, Point) {
        let near = (quiet as f32 + 3.5) * scale as f32;
        let far = (quiet + dim) as f32 * scale as f32 - 3.5 * scale as f32;
        (
            Point::new(near, near),
            Point::new(far, near),
            Point::new(near, far),
        )
    }

    #[test]
    fn test_samples_clean_symbol_exactly() {
        let modules = QrBuilder::new("grid sampling").build_modules().expect("encodable");
        let dim = modules.width();
        let image = render(&modules, 4, 4);
        let (tl, tr, bl) = finder_centers(4, 4, dim);

        let sampler = GridSampler::new(&image, tl, tr, bl, dim, 4.0).expect("inside");
        assert_eq!(sampler.sample(), modules);
    }

    #[test]
    fn test_refined_uses_alignment_pattern() {
        let modules = QrBuilder::new("https://example.com/alignment/refinement")
            .build_modules()
            .expect("encodable");
        let dim = modules.width();
        assert!(dim >= 25);
        let image = render(&modules, 3, 4);
        let (tl, tr, bl) = finder_centers(4, 3, dim);

        let sampler = GridSampler::new(&image, tl, tr, bl, dim, 3.0).expect("inside");
        assert_eq!(sampler.refined().expect("alignment found"), modules);
    }

    #[test]
    fn test_symbol_leaving_bitmap_is_geometry_error() {
        let image = BitMatrix::new(100, 100);
        let result = GridSampler::new(
            &image,
            Point::new(14.0, 14.0),
            Point::new(200.0, 14.0),
            Point::new(14.0, 200.0),
            25,
            8.0,
        );
        assert!(matches!(result, Err(DecodeError::Geometry { .. })));
    }

    #[test]
    fn test_collinear_finders_are_geometry_error() {
        let image = BitMatrix::new(100, 100);
        let p = Point::new(40.0, 40.0);
        let result = GridSampler::new(&image, p, Point::new(80.0, 40.0), Point::new(60.0, 40.0), 21, 2.0);
        assert!(matches!(result, Err(DecodeError::Geometry { .. })));
    }
}
