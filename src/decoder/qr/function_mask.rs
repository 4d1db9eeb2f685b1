use crate::models::BitMatrix;

/// Function module mask for a specific QR version.
/// true = function module (not data), false = data module.
pub struct FunctionMask {
    mask: BitMatrix,
    version: u8,
}

impl FunctionMask {
    /// Mark finders, separators, timing, alignment, format and version areas.
    pub fn new(version: u8) -> Self {
        let size = 17 + 4 * version as usize;
        let mut mask = BitMatrix::new(size, size);

        // Finder patterns + separators (8x8 areas, clipped to bounds)
        Self::mark_finder_area(&mut mask, 0, 0);
        Self::mark_finder_area(&mut mask, size - 7, 0);
        Self::mark_finder_area(&mut mask, 0, size - 7);

        // Timing patterns (row 6 and column 6)
        for i in 0..size {
            mask.set(6, i, true);
            mask.set(i, 6, true);
        }

        for (cx, cy) in alignment_pattern_centers(version) {
            for y in cy - 2..=cy + 2 {
                for x in cx - 2..=cx + 2 {
                    mask.set(x, y, true);
                }
            }
        }

        // Format info areas
        for i in 0..9 {
            if i != 6 {
                mask.set(8, i, true);
                mask.set(i, 8, true);
            }
        }
        for i in 0..8 {
            mask.set(size - 1 - i, 8, true);
            mask.set(8, size - 1 - i, true);
        }

        // Dark module
        mask.set(8, size - 8, true);

        // Version info (v7+)
        if version >= 7 {
            for dy in 0..6 {
                for dx in 0..3 {
                    mask.set(size - 11 + dx, dy, true);
                    mask.set(dy, size - 11 + dx, true);
                }
            }
        }

        Self { mask, version }
    }

    /// Side length in modules
    pub fn size(&self) -> usize {
        self.mask.width()
    }

    /// QR version
    pub fn version(&self) -> u8 {
        self.version
    }

    /// True for function modules.
    pub fn is_function(&self, x: usize, y: usize) -> bool {
        self.mask.get(x, y)
    }

    /// Modules left for data and error correction.
    pub fn data_modules_count(&self) -> usize {
        let size = self.size();
        size * size - self.mask.count_dark()
    }

    fn mark_finder_area(mask: &mut BitMatrix, x: usize, y: usize) {
        let size = mask.width();
        let start_x = x.saturating_sub(1);
        let start_y = y.saturating_sub(1);
        let end_x = (x + 8).min(size);
        let end_y = (y + 8).min(size);
        for yy in start_y..end_y {
            for xx in start_x..end_x {
                mask.set(xx, yy, true);
            }
        }
    }
}

/// Alignment pattern center coordinates along one axis for a given version.
pub fn alignment_pattern_positions(version: u8) -> Vec<usize> {
    if version < 2 {
        return Vec::new();
    }
    let num_align = (version as usize / 7) + 2;
    let size = 17 + 4 * version as usize;
    let step = if version == 32 {
        26
    } else {
        (version as usize * 4 + num_align * 2 + 1) / (num_align * 2 - 2) * 2
    };

    let mut positions = vec![6usize; num_align];
    let mut pos = size - 7;
    for slot in positions.iter_mut().skip(1).rev() {
        *slot = pos;
        pos = pos.saturating_sub(step);
    }
    positions
}

/// Every alignment pattern center (x, y) that does not collide with a finder.
pub fn alignment_pattern_centers(version: u8) -> Vec<(usize, usize)> {
    let positions = alignment_pattern_positions(version);
    let (first, last) = match (positions.first(), positions.last()) {
        (Some(&f), Some(&l)) => (f, l),
        _ => return Vec::new(),
    };
    let mut centers = Vec::with_capacity(positions.len() * positions.len());
    for &cy in &positions {
        for &cx in &positions {
            let corner = (cx == first && cy == first)
                || (cx == last && cy == first)
                || (cx == first && cy == last);
            if !corner {
                centers.push((cx, cy));
            }
        }
    }
    centers
}
