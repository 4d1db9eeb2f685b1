//! Linear (1D) symbology decoders.
//!
//! Every reader works on run lengths taken along one scan line. The runs
//! start with the first bar of the start guard and end with the last bar of
//! the stop guard; quiet zones are not part of the slice.

/// Code 128 (sets A, B and C)
pub mod code128;
/// Code 39 (standard alphabet)
pub mod code39;
/// EAN-13, UPC-A and EAN-8
pub mod ean;
/// Interleaved 2 of 5
pub mod itf;

use crate::models::{Barcode, Symbology, SymbologySet};

/// A linear symbology family the locator can search for and decode.
pub trait LinearReader: Sync {
    /// Symbologies this reader can report.
    fn symbologies(&self) -> &'static [Symbology];

    /// Minimum light run, in modules, before the start guard.
    fn quiet_zone(&self) -> f32;

    /// Whether a start guard touching the row's left edge is acceptable.
    fn allows_row_start(&self) -> bool {
        true
    }

    /// If `runs` opens with this family's start guard, the module size it
    /// implies. `runs` begins with a bar.
    fn match_start(&self, runs: &[u32]) -> Option<f32>;

    /// Decode a whole symbol. Reports only symbologies contained in
    /// `formats`.
    fn decode(&self, runs: &[u32], formats: SymbologySet) -> Option<Barcode>;

    /// Tag used for candidates of this family under `formats`.
    fn candidate_symbology(&self, formats: SymbologySet) -> Option<Symbology> {
        self.symbologies()
            .iter()
            .copied()
            .find(|s| formats.contains(*s))
    }
}

static CODE128: code128::Code128Reader = code128::Code128Reader;
static CODE39: code39::Code39Reader = code39::Code39Reader;
static EAN: ean::EanReader = ean::EanReader;
static ITF: itf::ItfReader = itf::ItfReader;

/// All readers in locator priority order.
pub fn readers() -> [&'static dyn LinearReader; 4] {
    [&CODE128, &EAN, &CODE39, &ITF]
}

/// The reader responsible for `symbology`, if it is linear.
pub fn reader_for(symbology: Symbology) -> Option<&'static dyn LinearReader> {
    match symbology {
        Symbology::Code128 => Some(&CODE128),
        Symbology::Code39 => Some(&CODE39),
        Symbology::Ean13 | Symbology::Ean8 | Symbology::UpcA => Some(&EAN),
        Symbology::Itf => Some(&ITF),
        Symbology::QrCode => None,
    }
}

/// Readers with at least one symbology in `formats`.
pub fn readers_for(formats: SymbologySet) -> Vec<&'static dyn LinearReader> {
    readers()
        .into_iter()
        .filter(|r| r.candidate_symbology(formats).is_some())
        .collect()
}

/// Average per-pixel deviation of `counters` from `pattern` scaled to the
/// same total. Returns infinity when any single element deviates by more
/// than `max_individual_variance` modules.
pub(crate) fn pattern_match_variance(
    counters: &[u32],
    pattern: &[u32],
    max_individual_variance: f32,
) -> f32 {
    let total: u32 = counters.iter().sum();
    let pattern_length: u32 = pattern.iter().sum();
    if total < pattern_length || pattern_length == 0 {
        // less than one pixel per module
        return f32::INFINITY;
    }

    let unit = total as f32 / pattern_length as f32;
    let max_individual = max_individual_variance * unit;

    let mut total_variance = 0.0f32;
    for (&counter, &expected) in counters.iter().zip(pattern) {
        let scaled = expected as f32 * unit;
        let variance = (counter as f32 - scaled).abs();
        if variance > max_individual {
            return f32::INFINITY;
        }
        total_variance += variance;
    }
    total_variance / total as f32
}

/// Pick the pattern with the smallest variance below `max_average`.
pub(crate) fn best_pattern<const N: usize>(
    counters: &[u32],
    patterns: &[[u32; N]],
    max_average: f32,
    max_individual: f32,
) -> Option<(usize, f32)> {
    patterns
        .iter()
        .enumerate()
        .map(|(i, p)| (i, pattern_match_variance(counters, p, max_individual)))
        .filter(|&(_, v)| v < max_average)
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Bitmask of the `wide_count` widest elements (first element in the
/// highest bit), or `None` when wide and narrow cannot be told apart.
pub(crate) fn wide_elements(counters: &[u32], wide_count: usize) -> Option<u32> {
    if counters.len() < wide_count || counters.len() > 32 {
        return None;
    }
    let mut order: Vec<usize> = (0..counters.len()).collect();
    order.sort_by(|&a, &b| counters[b].cmp(&counters[a]).then(a.cmp(&b)));

    let narrowest_wide = counters[order[wide_count - 1]];
    let widest_narrow = order
        .get(wide_count)
        .map(|&i| counters[i])
        .unwrap_or(0)
        .max(1);
    if (narrowest_wide as f32) < widest_narrow as f32 * 1.5 {
        return None;
    }

    let mut mask = 0u32;
    for &i in &order[..wide_count] {
        mask |= 1 << (counters.len() - 1 - i);
    }
    Some(mask)
}

/// Turn per-symbol variances into a confidence score.
pub(crate) fn confidence_from_variance(variances: &[f32]) -> f32 {
    if variances.is_empty() {
        return 0.0;
    }
    let mean = variances.iter().sum::<f32>() / variances.len() as f32;
    (1.0 - mean).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variance_exact_and_scaled() {
        assert_eq!(pattern_match_variance(&[2, 1, 1], &[2, 1, 1], 0.7), 0.0);
        assert_eq!(pattern_match_variance(&[6, 3, 3], &[2, 1, 1], 0.7), 0.0);
        let v = pattern_match_variance(&[7, 3, 2], &[2, 1, 1], 0.7);
        assert!(v > 0.0 && v < 0.25);
        assert!(pattern_match_variance(&[1, 5, 1], &[2, 1, 1], 0.7).is_infinite());
        assert!(pattern_match_variance(&[1, 1], &[3, 3], 0.7).is_infinite());
    }

    #[test]
    fn test_best_pattern_picks_closest() {
        let patterns = [[1, 1, 2], [2, 1, 1], [1, 2, 1]];
        assert_eq!(
            best_pattern(&[4, 2, 2], &patterns, 0.3, 0.7).map(|(i, _)| i),
            Some(1)
        );
        assert!(best_pattern(&[1, 1, 1], &patterns, 0.05, 0.7).is_none());
    }

    #[test]
    fn test_wide_elements() {
        // N W N N W: wide at 1 and 4
        assert_eq!(wide_elements(&[2, 5, 2, 2, 5], 2), Some(0b01001));
        assert_eq!(wide_elements(&[2, 2, 2, 2, 2], 2), None);
    }

    #[test]
    fn test_reader_lookup() {
        assert!(reader_for(Symbology::QrCode).is_none());
        let ean = reader_for(Symbology::UpcA).expect("linear");
        assert!(ean.symbologies().contains(&Symbology::Ean13));

        let only_ean8 = SymbologySet::only(Symbology::Ean8);
        let active = readers_for(only_ean8);
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].candidate_symbology(only_ean8), Some(Symbology::Ean8));
        assert!(readers_for(SymbologySet::only(Symbology::QrCode)).is_empty());
    }
}
