//! EAN-13, UPC-A and EAN-8.
//!
//! Both layouts share guards and digit patterns. Left-half digits of EAN-13
//! come in two parities whose sequence encodes the leading digit; UPC-A is
//! an EAN-13 with a leading zero.

use super::{LinearReader, best_pattern, confidence_from_variance, pattern_match_variance};
use crate::models::{Barcode, Symbology, SymbologySet};

const MAX_AVG_VARIANCE: f32 = 0.48;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;

pub(crate) const START_END_PATTERN: [u32; 3] = [1, 1, 1];
pub(crate) const MIDDLE_PATTERN: [u32; 5] = [1, 1, 1, 1, 1];

/// Odd-parity digit widths, space first on the left half.
pub(crate) const L_PATTERNS: [[u32; 4]; 10] = [
    [3, 2, 1, 1],
    [2, 2, 2, 1],
    [2, 1, 2, 2],
    [1, 4, 1, 1],
    [1, 1, 3, 2],
    [1, 2, 3, 1],
    [1, 1, 1, 4],
    [1, 3, 1, 2],
    [1, 2, 1, 3],
    [3, 1, 1, 2],
];

/// Even-parity widths: the L widths reversed.
pub(crate) const G_PATTERNS: [[u32; 4]; 10] = {
    let mut out = [[0u32; 4]; 10];
    let mut i = 0;
    while i < 10 {
        let l = L_PATTERNS[i];
        out[i] = [l[3], l[2], l[1], l[0]];
        i += 1;
    }
    out
};

/// Parity of the six left digits for each leading digit; bit 5 is the first
/// left digit, a set bit means even parity.
pub(crate) const FIRST_DIGIT_ENCODINGS: [u8; 10] =
    [0x00, 0x0B, 0x0D, 0x0E, 0x13, 0x19, 0x1C, 0x15, 0x16, 0x1A];

const EAN13_RUNS: usize = 3 + 6 * 4 + 5 + 6 * 4 + 3;
const EAN8_RUNS: usize = 3 + 4 * 4 + 5 + 4 * 4 + 3;

/// Standard mod-10 check used by all three layouts.
pub fn checksum_ok(digits: &[u8]) -> bool {
    let Some((&check, body)) = digits.split_last() else {
        return false;
    };
    check_digit(body) == check
}

/// Check digit for `body`: weight 3 on the digit next to the check digit
/// and every second one from there.
pub fn check_digit(body: &[u8]) -> u8 {
    let sum: u32 = body
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| if i % 2 == 0 { 3 * d as u32 } else { d as u32 })
        .sum();
    ((10 - sum % 10) % 10) as u8
}

struct Digits {
    digits: Vec<u8>,
    variances: Vec<f32>,
}

/// Reader for the EAN/UPC family.
pub struct EanReader;

impl EanReader {
    fn guard_ok(runs: &[u32], pattern: &[u32]) -> Option<f32> {
        let variance = pattern_match_variance(runs, pattern, MAX_INDIVIDUAL_VARIANCE);
        (variance < MAX_AVG_VARIANCE).then_some(variance)
    }

    /// Read `count` digits starting at `pos`. With `allow_even` the digit
    /// may use either parity; the returned mask records even digits.
    fn read_half(
        runs: &[u32],
        pos: usize,
        count: usize,
        allow_even: bool,
        out: &mut Digits,
    ) -> Option<u8> {
        let mut parity = 0u8;
        for d in 0..count {
            let start = pos + d * 4;
            let counters = runs.get(start..start + 4)?;
            let odd = best_pattern(counters, &L_PATTERNS, MAX_AVG_VARIANCE, MAX_INDIVIDUAL_VARIANCE);
            let even = if allow_even {
                best_pattern(counters, &G_PATTERNS, MAX_AVG_VARIANCE, MAX_INDIVIDUAL_VARIANCE)
            } else {
                None
            };
            let (digit, variance, is_even) = match (odd, even) {
                (Some(o), Some(e)) if e.1 < o.1 => (e.0, e.1, true),
                (Some(o), _) => (o.0, o.1, false),
                (None, Some(e)) => (e.0, e.1, true),
                (None, None) => return None,
            };
            out.digits.push(digit as u8);
            out.variances.push(variance);
            if is_even {
                parity |= 1 << (count - 1 - d);
            }
        }
        Some(parity)
    }

    fn decode_ean13(runs: &[u32]) -> Option<Digits> {
        let runs = runs.get(..EAN13_RUNS)?;
        let mut out = Digits {
            digits: Vec::with_capacity(13),
            variances: Vec::with_capacity(15),
        };
        out.variances.push(Self::guard_ok(&runs[..3], &START_END_PATTERN)?);

        let parity = Self::read_half(runs, 3, 6, true, &mut out)?;
        let first = FIRST_DIGIT_ENCODINGS.iter().position(|&p| p == parity)? as u8;
        out.digits.insert(0, first);

        out.variances.push(Self::guard_ok(&runs[27..32], &MIDDLE_PATTERN)?);
        Self::read_half(runs, 32, 6, false, &mut out)?;
        out.variances.push(Self::guard_ok(&runs[56..59], &START_END_PATTERN)?);

        checksum_ok(&out.digits).then_some(out)
    }

    fn decode_ean8(runs: &[u32]) -> Option<Digits> {
        let runs = runs.get(..EAN8_RUNS)?;
        let mut out = Digits {
            digits: Vec::with_capacity(8),
            variances: Vec::with_capacity(11),
        };
        out.variances.push(Self::guard_ok(&runs[..3], &START_END_PATTERN)?);
        Self::read_half(runs, 3, 4, false, &mut out)?;
        out.variances.push(Self::guard_ok(&runs[19..24], &MIDDLE_PATTERN)?);
        Self::read_half(runs, 24, 4, false, &mut out)?;
        out.variances.push(Self::guard_ok(&runs[40..43], &START_END_PATTERN)?);

        checksum_ok(&out.digits).then_some(out)
    }

    fn to_text(digits: &[u8]) -> String {
        digits.iter().map(|&d| (b'0' + d) as char).collect()
    }
}

impl LinearReader for EanReader {
    fn symbologies(&self) -> &'static [Symbology] {
        &[Symbology::Ean13, Symbology::UpcA, Symbology::Ean8]
    }

    fn quiet_zone(&self) -> f32 {
        5.0
    }

    fn match_start(&self, runs: &[u32]) -> Option<f32> {
        if runs.len() < EAN8_RUNS {
            return None;
        }
        let guard = &runs[..3];
        Self::guard_ok(guard, &START_END_PATTERN)?;
        Some(guard.iter().sum::<u32>() as f32 / 3.0)
    }

    fn decode(&self, runs: &[u32], formats: SymbologySet) -> Option<Barcode> {
        let wants_13 = formats.contains(Symbology::Ean13) || formats.contains(Symbology::UpcA);
        if wants_13 && runs.len() >= EAN13_RUNS {
            if let Some(read) = Self::decode_ean13(runs) {
                let confidence = confidence_from_variance(&read.variances);
                if read.digits[0] == 0 && formats.contains(Symbology::UpcA) {
                    let text = Self::to_text(&read.digits[1..]);
                    return Some(Barcode::from_text(text, Symbology::UpcA, confidence));
                }
                if formats.contains(Symbology::Ean13) {
                    let text = Self::to_text(&read.digits);
                    return Some(Barcode::from_text(text, Symbology::Ean13, confidence));
                }
                return None;
            }
        }

        if formats.contains(Symbology::Ean8) && runs.len() >= EAN8_RUNS {
            if let Some(read) = Self::decode_ean8(runs) {
                let confidence = confidence_from_variance(&read.variances);
                let text = Self::to_text(&read.digits);
                return Some(Barcode::from_text(text, Symbology::Ean8, confidence));
            }
        }
        None
    }
}
