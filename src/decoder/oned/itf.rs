//! Interleaved 2 of 5.
//!
//! Digits come in pairs: the five bars of a pair carry the first digit and
//! the five spaces between them carry the second.

use super::{LinearReader, pattern_match_variance, wide_elements};
use crate::models::{Barcode, Symbology, SymbologySet};

/// Five elements per digit, first element in the highest bit, 1 = wide.
pub(crate) const DIGIT_PATTERNS: [u8; 10] = [
    0b00110, // 0 NNWWN
    0b10001, // 1 WNNNW
    0b01001, // 2 NWNNW
    0b11000, // 3 WWNNN
    0b00101, // 4 NNWNW
    0b10100, // 5 WNWNN
    0b01100, // 6 NWWNN
    0b00011, // 7 NNNWW
    0b10010, // 8 WNNWN
    0b01010, // 9 NWNWN
];

const START_RUNS: usize = 4;
const END_RUNS: usize = 3;
const MAX_START_VARIANCE: f32 = 0.38;

/// Shortest lengths accepted below 14 digits; longer symbols are always fine.
const ALLOWED_LENGTHS: [usize; 5] = [6, 8, 10, 12, 14];

fn length_allowed(len: usize) -> bool {
    len > 14 || ALLOWED_LENGTHS.contains(&len)
}

/// Reader for ITF.
pub struct ItfReader;

impl ItfReader {
    fn digit(counters: &[u32; 5]) -> Option<u8> {
        let mask = wide_elements(counters, 2)? as u8;
        DIGIT_PATTERNS.iter().position(|&p| p == mask).map(|d| d as u8)
    }

    fn end_ok(end: &[u32], narrow: f32) -> bool {
        let [wide, space, bar] = [end[0] as f32, end[1] as f32, end[2] as f32];
        wide >= 1.5 * narrow && space < 1.6 * narrow && bar < 1.6 * narrow
    }
}

impl LinearReader for ItfReader {
    fn symbologies(&self) -> &'static [Symbology] {
        &[Symbology::Itf]
    }

    fn quiet_zone(&self) -> f32 {
        10.0
    }

    fn allows_row_start(&self) -> bool {
        false
    }

    fn match_start(&self, runs: &[u32]) -> Option<f32> {
        if runs.len() < START_RUNS + 30 + END_RUNS {
            return None;
        }
        let start = &runs[..START_RUNS];
        let variance = pattern_match_variance(start, &[1, 1, 1, 1], 0.7);
        (variance < MAX_START_VARIANCE).then(|| start.iter().sum::<u32>() as f32 / 4.0)
    }

    fn decode(&self, runs: &[u32], formats: SymbologySet) -> Option<Barcode> {
        if !formats.contains(Symbology::Itf) {
            return None;
        }
        let body_len = runs.len().checked_sub(START_RUNS + END_RUNS)?;
        if body_len == 0 || body_len % 10 != 0 {
            return None;
        }
        let narrow = self.match_start(runs)?;

        let body = &runs[START_RUNS..START_RUNS + body_len];
        let mut text = String::with_capacity(body_len / 5);
        for pair in body.chunks_exact(10) {
            let bars = [pair[0], pair[2], pair[4], pair[6], pair[8]];
            let spaces = [pair[1], pair[3], pair[5], pair[7], pair[9]];
            text.push((b'0' + Self::digit(&bars)?) as char);
            text.push((b'0' + Self::digit(&spaces)?) as char);
        }

        if !Self::end_ok(&runs[START_RUNS + body_len..], narrow) || !length_allowed(text.len()) {
            return None;
        }
        Some(Barcode::from_text(text, Symbology::Itf, 0.9))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::itf::encode;

    #[test]
    fn test_patterns_have_two_wide() {
        assert!(DIGIT_PATTERNS.iter().all(|p| p.count_ones() == 2));
    }

    #[test]
    fn test_decode_pairs() {
        let runs = encode("1234567890", 2, 5).expect("encodable");
        let barcode = ItfReader.decode(&runs, SymbologySet::all()).expect("decodes");
        assert_eq!(barcode.text, "1234567890");
        assert_eq!(barcode.symbology, Symbology::Itf);
    }

    #[test]
    fn test_length_rules() {
        assert!(length_allowed(6));
        assert!(length_allowed(16));
        assert!(!length_allowed(4));
        // 4 digits is a valid ITF symbol but below the accepted lengths
        let runs = encode("1234", 2, 5).expect("encodable");
        assert!(ItfReader.decode(&runs, SymbologySet::all()).is_none());
    }

    #[test]
    fn test_odd_digit_count_is_not_encodable() {
        assert!(encode("123", 2, 5).is_none());
    }

    #[test]
    fn test_match_start() {
        let runs = encode("000000", 3, 8).expect("encodable");
        assert!((ItfReader.match_start(&runs).expect("start") - 3.0).abs() < 1e-3);
        assert!(ItfReader.match_start(&runs[..10]).is_none());
    }
}
