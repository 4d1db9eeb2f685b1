//! Orientation candidates for a sampled symbol grid.
//!
//! The locator orders finder patterns so a grid normally arrives upright.
//! Mirrored symbols and mis-ordered triples still reach the decoder, so
//! every quarter turn and mirror whose finder corners look right is tried.
use crate::models::BitMatrix;

pub(super) fn rotate90(matrix: &BitMatrix) -> BitMatrix {
    let n = matrix.width();
    let mut out = BitMatrix::new(n, n);
    for y in 0..n {
        for x in 0..n {
            out.set(n - 1 - y, x, matrix.get(x, y));
        }
    }
    out
}

pub(super) fn flip_horizontal(matrix: &BitMatrix) -> BitMatrix {
    let n = matrix.width();
    let mut out = BitMatrix::new(n, n);
    for y in 0..n {
        for x in 0..n {
            out.set(n - 1 - x, y, matrix.get(x, y));
        }
    }
    out
}

/// Dark/light sample points inside a finder, relative to its top-left module.
const FINDER_PROBES: [(usize, usize, bool); 8] = [
    (0, 0, true),
    (6, 0, true),
    (0, 6, true),
    (6, 6, true),
    (3, 3, true),
    (1, 1, false),
    (5, 5, false),
    (2, 2, true),
];

pub(super) fn has_finders_with_tolerance(matrix: &BitMatrix, max_mismatches: usize) -> bool {
    let dim = matrix.width();
    if dim < 21 || matrix.height() != dim {
        return false;
    }

    let origins = [(0, 0), (dim - 7, 0), (0, dim - 7)];
    let mismatches = origins
        .iter()
        .flat_map(|&(ox, oy)| {
            FINDER_PROBES
                .iter()
                .map(move |&(dx, dy, expected)| (ox + dx, oy + dy, expected))
        })
        .filter(|&(x, y, expected)| matrix.get(x, y) != expected)
        .count();

    mismatches <= max_mismatches
}

/// Fraction of neighbouring timing modules that alternate.
pub(super) fn timing_alternation(matrix: &BitMatrix) -> f32 {
    let dim = matrix.width();
    if dim < 21 {
        return 0.0;
    }
    let horizontal: Vec<bool> = (8..dim - 8).map(|x| matrix.get(x, 6)).collect();
    let vertical: Vec<bool> = (8..dim - 8).map(|y| matrix.get(6, y)).collect();
    (alternation_ratio(&horizontal) + alternation_ratio(&vertical)) / 2.0
}

fn alternation_ratio(bits: &[bool]) -> f32 {
    if bits.len() < 2 {
        return 0.0;
    }
    let transitions = bits.windows(2).filter(|w| w[0] != w[1]).count();
    transitions as f32 / (bits.len() - 1) as f32
}

/// Upright first, then the other quarter turns, then mirrors.
pub(super) fn candidate_orientations(matrix: &BitMatrix, max_mismatches: usize) -> Vec<BitMatrix> {
    let mut turns = Vec::with_capacity(8);
    let mut current = matrix.clone();
    for _ in 0..4 {
        let next = rotate90(&current);
        turns.push(current);
        current = next;
    }
    let mirrored = flip_horizontal(matrix);
    let mut current = mirrored;
    for _ in 0..4 {
        let next = rotate90(&current);
        turns.push(current);
        current = next;
    }

    turns
        .into_iter()
        .filter(|m| has_finders_with_tolerance(m, max_mismatches))
        .collect()
}
