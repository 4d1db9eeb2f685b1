//! Pattern locator: finder and guard search over one binary bitmap.

use tracing::debug;

use super::finder::FinderDetector;
use super::grouping::{FinderGroup, find_groups};
use super::linear::scan_linear;
use crate::models::{BitMatrix, Candidate, CandidateGeometry, Symbology, SymbologySet};

/// How a locator pass is run.
#[derive(Debug, Clone, Copy)]
pub struct LocatorSettings {
    /// Symbologies to search for (already defaulted by the caller)
    pub formats: SymbologySet,
    /// Rows scanned for linear start guards
    pub scan_rows: usize,
    /// Cap on candidates returned
    pub max_candidates: usize,
    /// Keep extra rows per linear cluster
    pub try_harder: bool,
}

/// Propose candidates in scan order: matrix symbols first, then linear
/// ones, each sorted top-to-bottom and left-to-right.
pub fn locate(matrix: &BitMatrix, settings: &LocatorSettings) -> Vec<Candidate> {
    let mut candidates = Vec::new();

    if settings.formats.contains(Symbology::QrCode) {
        let patterns = FinderDetector::detect(matrix);
        let groups = find_groups(&patterns, settings.max_candidates);
        let mut qr: Vec<Candidate> = dedupe_groups(groups)
            .into_iter()
            .map(|g| Candidate {
                symbology: Symbology::QrCode,
                geometry: CandidateGeometry::Matrix {
                    top_left: g.top_left,
                    top_right: g.top_right,
                    bottom_left: g.bottom_left,
                    dimension: g.dimension,
                },
                module_size: g.module_size,
                scan_index: 0,
            })
            .collect();
        sort_scan_order(&mut qr);
        debug!(
            finder_patterns = patterns.len(),
            candidates = qr.len(),
            "matrix search done"
        );
        candidates.extend(qr);
    }

    if settings.formats.has_linear() {
        let mut linear = scan_linear(
            matrix,
            settings.formats,
            settings.scan_rows,
            settings.try_harder,
        );
        sort_scan_order(&mut linear);
        debug!(candidates = linear.len(), "linear search done");
        candidates.extend(linear);
    }

    candidates.truncate(settings.max_candidates);
    for (index, candidate) in candidates.iter_mut().enumerate() {
        candidate.scan_index = index;
    }
    candidates
}

/// Drop groups describing the same symbol as a better-scored group: centers
/// within half a side of each other, whatever dimension each one estimated.
fn dedupe_groups(groups: Vec<FinderGroup>) -> Vec<FinderGroup> {
    let mut kept: Vec<FinderGroup> = Vec::with_capacity(groups.len());
    for group in groups {
        let center = group.top_right.midpoint(&group.bottom_left);
        let side = group.dimension as f32 * group.module_size;
        let duplicate = kept.iter().any(|k| {
            let kept_side = k.dimension as f32 * k.module_size;
            k.top_right.midpoint(&k.bottom_left).distance(&center) < side.max(kept_side) / 2.0
        });
        if !duplicate {
            kept.push(group);
        }
    }
    kept
}

fn sort_scan_order(candidates: &mut [Candidate]) {
    candidates.sort_by(|a, b| {
        let (pa, pb) = (a.anchor(), b.anchor());
        pa.y.total_cmp(&pb.y).then(pa.x.total_cmp(&pb.x))
    });
}
