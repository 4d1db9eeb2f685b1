//! QR finder pattern detection: 1:1:3:1:1 row scanning, confirmed by
//! vertical and horizontal cross-checks through the candidate center.

use crate::models::{BitMatrix, Point};

/// A confirmed finder pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderPattern {
    /// Center in pixel coordinates
    pub center: Point,
    /// Estimated module size in pixels
    pub module_size: f32,
    /// Number of scan rows that confirmed this pattern
    pub count: usize,
}

impl FinderPattern {
    /// A pattern seen by one scan row.
    pub fn new(x: f32, y: f32, module_size: f32) -> Self {
        Self {
            center: Point::new(x, y),
            module_size,
            count: 1,
        }
    }

    /// Same physical pattern, within one module of position and size.
    fn about_equals(&self, other: &FinderPattern) -> bool {
        let dx = (self.center.x - other.center.x).abs();
        let dy = (self.center.y - other.center.y).abs();
        if dx > self.module_size || dy > self.module_size {
            return false;
        }
        let size_diff = (self.module_size - other.module_size).abs();
        size_diff <= 1.0 || size_diff <= self.module_size
    }

    /// Count-weighted average with another sighting.
    fn combine(&self, other: &FinderPattern) -> FinderPattern {
        let total = (self.count + other.count) as f32;
        let w_self = self.count as f32 / total;
        let w_other = other.count as f32 / total;
        FinderPattern {
            center: Point::new(
                self.center.x * w_self + other.center.x * w_other,
                self.center.y * w_self + other.center.y * w_other,
            ),
            module_size: self.module_size * w_self + other.module_size * w_other,
            count: self.count + other.count,
        }
    }
}

/// 1:1:3:1:1 finder search.
pub struct FinderDetector;

impl FinderDetector {
    /// Every confirmed finder pattern, merged.
    pub fn detect(matrix: &BitMatrix) -> Vec<FinderPattern> {
        let width = matrix.width();
        let height = matrix.height();
        let mut patterns: Vec<FinderPattern> = Vec::new();
        if width < 7 || height < 7 {
            return patterns;
        }

        for y in 0..height {
            // Skip rows with no edges
            if !Self::has_significant_edges(matrix, y, width) {
                continue;
            }
            for hit in Self::scan_row(matrix, y, width) {
                Self::merge_into(&mut patterns, hit);
            }
        }

        patterns
    }

    /// Check if row has enough edge transitions to potentially contain patterns
    fn has_significant_edges(matrix: &BitMatrix, y: usize, width: usize) -> bool {
        let mut transitions = 0;
        let sample_step = 2;
        let mut prev_color = matrix.get(0, y);

        for x in (sample_step..width).step_by(sample_step) {
            let color = matrix.get(x, y);
            if color != prev_color {
                transitions += 1;
                prev_color = color;
                if transitions >= 3 {
                    return true;
                }
            }
        }

        transitions >= 2
    }

    fn scan_row(matrix: &BitMatrix, y: usize, width: usize) -> Vec<FinderPattern> {
        let mut candidates = Vec::new();
        let mut run_lengths: Vec<usize> = Vec::new();
        let mut run_colors: Vec<bool> = Vec::new();
        let mut run_start = 0usize;
        let mut current_color = matrix.get(0, y);

        const MAX_PATTERNS_PER_ROW: usize = 8;

        // x == width closes the final run
        for x in 1..=width {
            let color = if x < width { matrix.get(x, y) } else { !current_color };
            if color == current_color {
                continue;
            }

            run_lengths.push(x - run_start);
            run_colors.push(current_color);
            run_start = x;
            current_color = color;

            let end_idx = run_colors.len();
            if end_idx < 5 {
                continue;
            }
            let colors = &run_colors[end_idx - 5..end_idx];
            let lengths = &run_lengths[end_idx - 5..end_idx];

            // dark-light-dark-light-dark
            if !(colors[0] && !colors[1] && colors[2] && !colors[3] && colors[4]) {
                continue;
            }
            if !Self::quick_ratio_check(lengths) {
                continue;
            }
            if let Some(pattern) = Self::check_pattern(matrix, lengths, x, y) {
                candidates.push(pattern);
                if candidates.len() >= MAX_PATTERNS_PER_ROW {
                    break;
                }
            }
        }

        candidates
    }

    /// Quick ratio validation - rough check before floating-point math
    fn quick_ratio_check(lengths: &[usize]) -> bool {
        let b1 = lengths[0];
        let w1 = lengths[1];
        let b2 = lengths[2];
        let w2 = lengths[3];
        let b3 = lengths[4];

        let total = b1 + w1 + b2 + w2 + b3;
        if total < 7 {
            return false;
        }

        // center black roughly 3x the outer blacks
        let b2_min = b1.min(b3);
        if b2 < b2_min * 2 || b2 > b2_min * 5 {
            return false;
        }

        let outer_avg = ((b1 + b3 + w1 + w2) / 4).max(1);
        let w1_ok = w1 * 2 >= outer_avg && w1 <= outer_avg * 2;
        let w2_ok = w2 * 2 >= outer_avg && w2 <= outer_avg * 2;

        w1_ok && w2_ok
    }

    /// Full ratio check followed by the cross-checks. `end_x` is one past
    /// the last dark pixel of the run window.
    fn check_pattern(
        matrix: &BitMatrix,
        lengths: &[usize],
        end_x: usize,
        y: usize,
    ) -> Option<FinderPattern> {
        let state = [
            lengths[0] as u32,
            lengths[1] as u32,
            lengths[2] as u32,
            lengths[3] as u32,
            lengths[4] as u32,
        ];
        if !found_pattern_cross(&state) {
            return None;
        }
        let h_total: u32 = state.iter().sum();
        let center_x = center_from_end(&state, end_x);

        let column = center_x as usize;
        let (center_y, v_total) = cross_check(matrix.height(), y, state[2], h_total, |i| {
            matrix.get(column, i)
        })?;

        let row = center_y as usize;
        let (center_x, h_total) = cross_check(matrix.width(), column, state[2], h_total, |i| {
            matrix.get(i, row)
        })?;

        let module_size = (h_total + v_total) as f32 / 14.0;
        Some(FinderPattern::new(center_x, center_y, module_size))
    }

    fn merge_into(patterns: &mut Vec<FinderPattern>, hit: FinderPattern) {
        match patterns.iter_mut().find(|p| p.about_equals(&hit)) {
            Some(existing) => *existing = existing.combine(&hit),
            None => patterns.push(hit),
        }
    }
}

/// 1:1:3:1:1 within half a module per element (1.5 on the core).
fn found_pattern_cross(state: &[u32; 5]) -> bool {
    let total: u32 = state.iter().sum();
    if total < 7 {
        return false;
    }
    let module = total as f32 / 7.0;
    let max_variance = module / 2.0;
    let near = |count: u32, modules: f32| (count as f32 - modules * module).abs() < modules * max_variance;
    near(state[0], 1.0)
        && near(state[1], 1.0)
        && near(state[2], 3.0)
        && near(state[3], 1.0)
        && near(state[4], 1.0)
}

fn center_from_end(state: &[u32; 5], end: usize) -> f32 {
    end as f32 - state[4] as f32 - state[3] as f32 - state[2] as f32 / 2.0
}

/// Re-measure the five runs along another axis through `center`. Returns
/// the refined center along that axis and the total pattern length.
fn cross_check(
    length: usize,
    center: usize,
    max_count: u32,
    original_total: u32,
    is_dark: impl Fn(usize) -> bool,
) -> Option<(f32, u32)> {
    if center >= length {
        return None;
    }
    let mut state = [0u32; 5];

    // walk back: core, inner light ring, outer dark ring
    let mut i = center as isize;
    while i >= 0 && is_dark(i as usize) {
        state[2] += 1;
        i -= 1;
    }
    if i < 0 {
        return None;
    }
    while i >= 0 && !is_dark(i as usize) && state[1] <= max_count {
        state[1] += 1;
        i -= 1;
    }
    if i < 0 || state[1] > max_count {
        return None;
    }
    while i >= 0 && is_dark(i as usize) && state[0] <= max_count {
        state[0] += 1;
        i -= 1;
    }
    if state[0] > max_count {
        return None;
    }

    // and forward
    let mut i = center + 1;
    while i < length && is_dark(i) {
        state[2] += 1;
        i += 1;
    }
    if i == length {
        return None;
    }
    while i < length && !is_dark(i) && state[3] < max_count {
        state[3] += 1;
        i += 1;
    }
    if i == length || state[3] >= max_count {
        return None;
    }
    while i < length && is_dark(i) && state[4] < max_count {
        state[4] += 1;
        i += 1;
    }
    if state[4] >= max_count {
        return None;
    }

    let total: u32 = state.iter().sum();
    if 5 * total.abs_diff(original_total) >= 2 * original_total {
        return None;
    }
    if !found_pattern_cross(&state) {
        return None;
    }
    Some((center_from_end(&state, i), total))
}
