//! Grouping of finder patterns into QR symbol candidates.
//!
//! Patterns are binned by module size, every plausible triple in a bin (and
//! its neighbour bin) is checked for a right angle, then ordered into
//! top-left / top-right / bottom-left and scored.

use tracing::trace;

use super::finder::FinderPattern;
use crate::models::Point;

/// Three ordered finder patterns and the symbol size they imply.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinderGroup {
    /// Corner finder center
    pub top_left: Point,
    /// Finder along the top edge
    pub top_right: Point,
    /// Finder along the left edge
    pub bottom_left: Point,
    /// Side length in modules (17 + 4 * version)
    pub dimension: usize,
    /// Mean module size of the three finders
    pub module_size: f32,
    /// Lower is better
    pub score: f32,
}

/// Form, order, score and trim finder triples. Best group first.
pub fn find_groups(patterns: &[FinderPattern], max_groups: usize) -> Vec<FinderGroup> {
    let triples = group_finder_patterns(patterns);
    let mut groups: Vec<FinderGroup> = triples
        .iter()
        .filter_map(|t| {
            let (a, b, c) = (&patterns[t[0]], &patterns[t[1]], &patterns[t[2]]);
            let (top_left, top_right, bottom_left, dimension, module_size) =
                order_finder_patterns(a, b, c)?;
            Some(FinderGroup {
                top_left,
                top_right,
                bottom_left,
                dimension,
                module_size,
                score: group_score(a, b, c),
            })
        })
        .collect();

    groups.sort_by(|a, b| a.score.total_cmp(&b.score));
    groups.truncate(max_groups);
    trace!(
        patterns = patterns.len(),
        groups = groups.len(),
        "finder groups formed"
    );
    groups
}

fn order_finder_patterns(
    a: &FinderPattern,
    b: &FinderPattern,
    c: &FinderPattern,
) -> Option<(Point, Point, Point, usize, f32)> {
    let patterns = [a, b, c];

    if patterns.iter().any(|p| p.module_size < 0.75) {
        return None;
    }

    // The right-angle corner is the top-left pattern
    let mut best_idx = 0usize;
    let mut best_cos = f32::INFINITY;
    for i in 0..3 {
        let p = &patterns[i].center;
        let p1 = &patterns[(i + 1) % 3].center;
        let p2 = &patterns[(i + 2) % 3].center;

        let v1x = p1.x - p.x;
        let v1y = p1.y - p.y;
        let v2x = p2.x - p.x;
        let v2y = p2.y - p.y;
        let dot = v1x * v2x + v1y * v2y;
        let denom = (v1x * v1x + v1y * v1y).sqrt() * (v2x * v2x + v2y * v2y).sqrt();
        if denom == 0.0 {
            continue;
        }
        let cos = (dot / denom).abs();
        if cos < best_cos {
            best_cos = cos;
            best_idx = i;
        }
    }

    let tl = patterns[best_idx];
    let p1 = patterns[(best_idx + 1) % 3];
    let p2 = patterns[(best_idx + 2) % 3];

    // y grows downwards, so a positive cross product puts p1 clockwise of p2
    let v1x = p1.center.x - tl.center.x;
    let v1y = p1.center.y - tl.center.y;
    let v2x = p2.center.x - tl.center.x;
    let v2y = p2.center.y - tl.center.y;
    let cross = v1x * v2y - v1y * v2x;

    let (tr, bl) = if cross > 0.0 { (p1, p2) } else { (p2, p1) };
    let avg_module = (tl.module_size + tr.module_size + bl.module_size) / 3.0;
    let d_tr = tl.center.distance(&tr.center);
    let d_bl = tl.center.distance(&bl.center);

    let dim1 = estimate_dimension_from_distance(d_tr, avg_module)?;
    let dim2 = estimate_dimension_from_distance(d_bl, avg_module)?;
    let dim = if dim1 == dim2 {
        dim1
    } else if dim1.abs_diff(dim2) <= 4 {
        estimate_dimension_from_distance((d_tr + d_bl) / 2.0, avg_module)?
    } else {
        return None;
    };

    let module_size = (d_tr + d_bl) / 2.0 / (dim as f32 - 7.0);
    let module_ratio = module_size / avg_module;
    if !(0.7..=1.3).contains(&module_ratio) {
        return None;
    }

    Some((tl.center, tr.center, bl.center, dim, module_size))
}

/// Finder centers sit 3.5 modules in from each edge, so their distance
/// spans `dimension - 7` modules.
pub fn estimate_dimension_from_distance(distance: f32, module_size: f32) -> Option<usize> {
    if module_size <= 0.0 {
        return None;
    }
    let raw_dim = distance / module_size + 7.0;
    if raw_dim < 19.0 {
        return None;
    }
    let version = ((raw_dim - 17.0) / 4.0).round() as i32;
    if !(1..=40).contains(&version) {
        return None;
    }
    Some(17 + 4 * version as usize)
}

/// Index triples of patterns with similar size and a near right angle.
fn group_finder_patterns(patterns: &[FinderPattern]) -> Vec<[usize; 3]> {
    if patterns.len() < 3 {
        return Vec::new();
    }

    let mut indexed: Vec<(usize, f32)> = patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (i, p.module_size))
        .collect();
    indexed.sort_by(|a, b| a.1.total_cmp(&b.1));

    let mut bins: Vec<Vec<usize>> = Vec::new();
    let mut current: Vec<usize> = Vec::new();
    let mut bin_min = 0.0f32;
    let bin_ratio = 1.25f32;

    for (idx, size) in indexed {
        if current.is_empty() {
            current.push(idx);
            bin_min = size;
            continue;
        }

        if size <= bin_min * bin_ratio {
            current.push(idx);
        } else {
            bins.push(std::mem::take(&mut current));
            current.push(idx);
            bin_min = size;
        }
    }
    if !current.is_empty() {
        bins.push(current);
    }

    // Each bin plus its neighbour, to allow slight size mismatch
    let mut all_groups = Vec::new();
    for i in 0..bins.len() {
        let mut indices = bins[i].clone();
        if i + 1 < bins.len() {
            indices.extend_from_slice(&bins[i + 1]);
        }
        if indices.len() < 3 {
            continue;
        }
        for group in build_groups(patterns, &indices) {
            if !all_groups.contains(&group) {
                all_groups.push(group);
            }
        }
    }

    all_groups
}

fn build_groups(patterns: &[FinderPattern], indices: &[usize]) -> Vec<[usize; 3]> {
    let mut groups = Vec::new();

    for idx_i in 0..indices.len() {
        let i = indices[idx_i];
        for idx_j in (idx_i + 1)..indices.len() {
            let j = indices[idx_j];
            for &k in indices.iter().skip(idx_j + 1) {
                let pi = &patterns[i];
                let pj = &patterns[j];
                let pk = &patterns[k];

                let sizes = [pi.module_size, pj.module_size, pk.module_size];
                let min_size = sizes.iter().fold(f32::INFINITY, |a, &b| a.min(b));
                let max_size = sizes.iter().fold(0.0f32, |a, &b| a.max(b));
                if max_size / min_size > 2.0 {
                    continue;
                }

                let d_ij = pi.center.distance(&pj.center);
                let d_ik = pi.center.distance(&pk.center);
                let d_jk = pj.center.distance(&pk.center);

                let distances = [d_ij, d_ik, d_jk];
                let min_d = distances.iter().fold(f32::INFINITY, |a, &b| a.min(b));
                let max_d = distances.iter().fold(0.0f32, |a, &b| a.max(b));

                let avg_module = (pi.module_size + pj.module_size + pk.module_size) / 3.0;
                // finders of one symbol are at least 14 modules apart
                if min_d < avg_module * 10.0 {
                    continue;
                }
                if max_d / min_d > 2.0 {
                    continue;
                }

                let a2 = d_ij * d_ij;
                let b2 = d_ik * d_ik;
                let c2 = d_jk * d_jk;

                let cos_i = (a2 + b2 - c2) / (2.0 * d_ij * d_ik);
                let cos_j = (a2 + c2 - b2) / (2.0 * d_ij * d_jk);
                let cos_k = (b2 + c2 - a2) / (2.0 * d_ik * d_jk);
                let has_right_angle = cos_i.abs() < 0.4 || cos_j.abs() < 0.4 || cos_k.abs() < 0.4;
                if !has_right_angle {
                    continue;
                }

                groups.push([i, j, k]);
            }
        }
    }

    groups
}

fn group_score(p0: &FinderPattern, p1: &FinderPattern, p2: &FinderPattern) -> f32 {
    let sizes = [p0.module_size, p1.module_size, p2.module_size];
    let min_size = sizes.iter().fold(f32::INFINITY, |a, &b| a.min(b));
    let max_size = sizes.iter().fold(0.0f32, |a, &b| a.max(b));
    let size_ratio = max_size / min_size;

    let d01 = p0.center.distance(&p1.center);
    let d02 = p0.center.distance(&p2.center);
    let d12 = p1.center.distance(&p2.center);

    // the two legs of a square symbol are equal
    let mut sides = [d01, d02, d12];
    sides.sort_by(f32::total_cmp);
    let leg_ratio = sides[1] / sides[0];

    // Prefer near-right angle (small cosine) and size consistency
    let a2 = d01 * d01;
    let b2 = d02 * d02;
    let c2 = d12 * d12;
    let cos_i = ((a2 + b2 - c2) / (2.0 * d01 * d02)).abs();
    let cos_j = ((a2 + c2 - b2) / (2.0 * d01 * d12)).abs();
    let cos_k = ((b2 + c2 - a2) / (2.0 * d02 * d12)).abs();
    let best_cos = cos_i.min(cos_j).min(cos_k);

    size_ratio * 2.0 + leg_ratio + best_cos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(x: f32, y: f32, module: f32) -> FinderPattern {
        FinderPattern::new(x, y, module)
    }

    #[test]
    fn test_orders_triple() {
        // version 1 at 4 px/module: finder centers 14 modules apart
        let patterns = [fp(70.0, 14.0, 4.0), fp(14.0, 70.0, 4.0), fp(14.0, 14.0, 4.0)];
        let groups = find_groups(&patterns, 10);
        assert_eq!(groups.len(), 1);
        let g = groups[0];
        assert_eq!(g.top_left, Point::new(14.0, 14.0));
        assert_eq!(g.top_right, Point::new(70.0, 14.0));
        assert_eq!(g.bottom_left, Point::new(14.0, 70.0));
        assert_eq!(g.dimension, 21);
        assert!((g.module_size - 4.0).abs() < 1e-3);
    }

    #[test]
    fn test_rotated_triple_keeps_handedness() {
        // the same symbol turned a quarter clockwise
        let patterns = [fp(70.0, 14.0, 4.0), fp(70.0, 70.0, 4.0), fp(14.0, 14.0, 4.0)];
        let groups = find_groups(&patterns, 10);
        assert_eq!(groups.len(), 1);
        let g = groups[0];
        assert_eq!(g.top_left, Point::new(70.0, 14.0));
        assert_eq!(g.top_right, Point::new(70.0, 70.0));
        assert_eq!(g.bottom_left, Point::new(14.0, 14.0));
    }

    #[test]
    fn test_rejects_collinear_and_mismatched() {
        let line = [fp(10.0, 10.0, 3.0), fp(60.0, 10.0, 3.0), fp(110.0, 10.0, 3.0)];
        assert!(find_groups(&line, 10).is_empty());

        let sizes = [fp(14.0, 14.0, 2.0), fp(70.0, 14.0, 4.0), fp(14.0, 70.0, 9.0)];
        assert!(find_groups(&sizes, 10).is_empty());
    }

    #[test]
    fn test_dimension_estimate() {
        assert_eq!(estimate_dimension_from_distance(56.0, 4.0), Some(21));
        assert_eq!(estimate_dimension_from_distance(18.0 * 3.0, 3.0), Some(25));
        assert_eq!(estimate_dimension_from_distance(10.0, 4.0), None);
    }
}
