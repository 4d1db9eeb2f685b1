//! Code 128 reader.
//!
//! Symbols are six runs (bar, space, bar, space, bar, space) eleven modules
//! wide. The stop symbol is followed by one extra two-module bar.

use super::{LinearReader, best_pattern, confidence_from_variance};
use crate::models::{Barcode, Symbology, SymbologySet};

const MAX_AVG_VARIANCE: f32 = 0.25;
const MAX_INDIVIDUAL_VARIANCE: f32 = 0.7;

const START_A: usize = 103;
const START_B: usize = 104;
const START_C: usize = 105;
const STOP: usize = 106;

const CODE_SHIFT: usize = 98;
const CODE_CODE_C: usize = 99;
const CODE_CODE_B: usize = 100;
const CODE_CODE_A: usize = 101;
const CODE_FNC_1: usize = 102;
const CODE_FNC_2: usize = 97;
const CODE_FNC_3: usize = 96;
const CODE_FNC_4_A: usize = 101;
const CODE_FNC_4_B: usize = 100;

const GROUP_SEPARATOR: char = '\u{1d}';

/// Run widths for symbol values 0..=105 plus the stop symbol (106).
pub(crate) const PATTERNS: [[u32; 6]; 107] = [
    [2, 1, 2, 2, 2, 2], [2, 2, 2, 1, 2, 2], [2, 2, 2, 2, 2, 1], [1, 2, 1, 2, 2, 3], [1, 2, 1, 3, 2, 2], [1, 3, 1, 2, 2, 2],
    [1, 2, 2, 2, 1, 3], [1, 2, 2, 3, 1, 2], [1, 3, 2, 2, 1, 2], [2, 2, 1, 2, 1, 3], [2, 2, 1, 3, 1, 2], [2, 3, 1, 2, 1, 2],
    [1, 1, 2, 2, 3, 2], [1, 2, 2, 1, 3, 2], [1, 2, 2, 2, 3, 1], [1, 1, 3, 2, 2, 2], [1, 2, 3, 1, 2, 2], [1, 2, 3, 2, 2, 1],
    [2, 2, 3, 2, 1, 1], [2, 2, 1, 1, 3, 2], [2, 2, 1, 2, 3, 1], [2, 1, 3, 2, 1, 2], [2, 2, 3, 1, 1, 2], [3, 1, 2, 1, 3, 1],
    [3, 1, 1, 2, 2, 2], [3, 2, 1, 1, 2, 2], [3, 2, 1, 2, 2, 1], [3, 1, 2, 2, 1, 2], [3, 2, 2, 1, 1, 2], [3, 2, 2, 2, 1, 1],
    [2, 1, 2, 1, 2, 3], [2, 1, 2, 3, 2, 1], [2, 3, 2, 1, 2, 1], [1, 1, 1, 3, 2, 3], [1, 3, 1, 1, 2, 3], [1, 3, 1, 3, 2, 1],
    [1, 1, 2, 3, 1, 3], [1, 3, 2, 1, 1, 3], [1, 3, 2, 3, 1, 1], [2, 1, 1, 3, 1, 3], [2, 3, 1, 1, 1, 3], [2, 3, 1, 3, 1, 1],
    [1, 1, 2, 1, 3, 3], [1, 1, 2, 3, 3, 1], [1, 3, 2, 1, 3, 1], [1, 1, 3, 1, 2, 3], [1, 1, 3, 3, 2, 1], [1, 3, 3, 1, 2, 1],
    [3, 1, 3, 1, 2, 1], [2, 1, 1, 3, 3, 1], [2, 3, 1, 1, 3, 1], [2, 1, 3, 1, 1, 3], [2, 1, 3, 3, 1, 1], [2, 1, 3, 1, 3, 1],
    [3, 1, 1, 1, 2, 3], [3, 1, 1, 3, 2, 1], [3, 3, 1, 1, 2, 1], [3, 1, 2, 1, 1, 3], [3, 1, 2, 3, 1, 1], [3, 3, 2, 1, 1, 1],
    [3, 1, 4, 1, 1, 1], [2, 2, 1, 4, 1, 1], [4, 3, 1, 1, 1, 1], [1, 1, 1, 2, 2, 4], [1, 1, 1, 4, 2, 2], [1, 2, 1, 1, 2, 4],
    [1, 2, 1, 4, 2, 1], [1, 4, 1, 1, 2, 2], [1, 4, 1, 2, 2, 1], [1, 1, 2, 2, 1, 4], [1, 1, 2, 4, 1, 2], [1, 2, 2, 1, 1, 4],
    [1, 2, 2, 4, 1, 1], [1, 4, 2, 1, 1, 2], [1, 4, 2, 2, 1, 1], [2, 4, 1, 2, 1, 1], [2, 2, 1, 1, 1, 4], [4, 1, 3, 1, 1, 1],
    [2, 4, 1, 1, 1, 2], [1, 3, 4, 1, 1, 1], [1, 1, 1, 2, 4, 2], [1, 2, 1, 1, 4, 2], [1, 2, 1, 2, 4, 1], [1, 1, 4, 2, 1, 2],
    [1, 2, 4, 1, 1, 2], [1, 2, 4, 2, 1, 1], [4, 1, 1, 2, 1, 2], [4, 2, 1, 1, 1, 2], [4, 2, 1, 2, 1, 1], [2, 1, 2, 1, 4, 1],
    [2, 1, 4, 1, 2, 1], [4, 1, 2, 1, 2, 1], [1, 1, 1, 1, 4, 3], [1, 1, 1, 3, 4, 1], [1, 3, 1, 1, 4, 1], [1, 1, 4, 1, 1, 3],
    [1, 1, 4, 3, 1, 1], [4, 1, 1, 1, 1, 3], [4, 1, 1, 3, 1, 1], [1, 1, 3, 1, 4, 1], [1, 1, 4, 1, 3, 1], [3, 1, 1, 1, 4, 1],
    [4, 1, 1, 1, 3, 1], [2, 1, 1, 4, 1, 2], [2, 1, 1, 2, 1, 4], [2, 1, 1, 2, 3, 2], [2, 3, 3, 1, 1, 1],
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CodeSet {
    A,
    B,
    C,
}

/// Reader for Code 128.
pub struct Code128Reader;

impl Code128Reader {
    fn match_symbol(runs: &[u32]) -> Option<(usize, f32)> {
        best_pattern(runs, &PATTERNS, MAX_AVG_VARIANCE, MAX_INDIVIDUAL_VARIANCE)
    }

    fn match_start_symbol(runs: &[u32]) -> Option<(usize, f32)> {
        best_pattern(
            runs.get(..6)?,
            &PATTERNS[START_A..=START_C],
            MAX_AVG_VARIANCE,
            MAX_INDIVIDUAL_VARIANCE,
        )
        .map(|(i, v)| (START_A + i, v))
    }

    /// Symbol values from start code to check symbol, plus their variances.
    fn read_codes(runs: &[u32]) -> Option<(Vec<usize>, Vec<f32>)> {
        let (start, start_variance) = Self::match_start_symbol(runs)?;
        let mut codes = vec![start];
        let mut variances = vec![start_variance];

        let mut pos = 6;
        loop {
            let (code, variance) = Self::match_symbol(runs.get(pos..pos + 6)?)?;
            pos += 6;
            variances.push(variance);
            if code == STOP {
                break;
            }
            if code >= START_A {
                return None;
            }
            codes.push(code);
        }

        // terminating bar, two modules wide
        let unit = runs[pos - 6..pos].iter().sum::<u32>() as f32 / 11.0;
        let bar = *runs.get(pos)? as f32;
        if (bar - 2.0 * unit).abs() > 1.5 * unit {
            return None;
        }

        // start, at least one symbol, check symbol
        if codes.len() < 3 {
            return None;
        }
        Some((codes, variances))
    }

    fn checksum_ok(codes: &[usize]) -> bool {
        let (check, body) = match codes.split_last() {
            Some(split) => split,
            None => return false,
        };
        let sum = body
            .iter()
            .enumerate()
            .map(|(i, &code)| if i == 0 { code } else { code * i })
            .sum::<usize>();
        sum % 103 == *check
    }
}

fn push_char(out: &mut String, upper_latched: bool, byte: u32, fnc4: &mut bool) -> Option<()> {
    let value = if upper_latched != *fnc4 { byte + 128 } else { byte };
    *fnc4 = false;
    out.push(char::from_u32(value)?);
    Some(())
}

/// One FNC4 shifts the next character into 128..=255; two in a row latch.
fn press_fnc4(pending: &mut bool, latched: &mut bool) {
    if *pending {
        *latched = !*latched;
        *pending = false;
    } else {
        *pending = true;
    }
}

/// Turn symbol values (without start and check) into text.
fn decode_values(start: usize, values: &[usize]) -> Option<String> {
    let mut set = match start {
        START_A => CodeSet::A,
        START_B => CodeSet::B,
        START_C => CodeSet::C,
        _ => return None,
    };

    let mut out = String::with_capacity(values.len() * 2);
    let mut shifted = false;
    let mut fnc4_pending = false;
    let mut upper_latched = false;

    for (index, &code) in values.iter().enumerate() {
        let active = if shifted {
            match set {
                CodeSet::A => CodeSet::B,
                CodeSet::B => CodeSet::A,
                CodeSet::C => CodeSet::C,
            }
        } else {
            set
        };
        let was_shifted = shifted;
        shifted = false;

        match active {
            CodeSet::A | CodeSet::B => {
                let is_a = active == CodeSet::A;
                match code {
                    0..=95 => {
                        let byte = if is_a && code >= 64 {
                            code as u32 - 64
                        } else {
                            b' ' as u32 + code as u32
                        };
                        push_char(&mut out, upper_latched, byte, &mut fnc4_pending)?;
                    }
                    CODE_FNC_1 => {
                        if index > 0 {
                            out.push(GROUP_SEPARATOR);
                        }
                    }
                    CODE_FNC_2 | CODE_FNC_3 => {}
                    CODE_SHIFT => {
                        if !was_shifted {
                            shifted = true;
                        }
                    }
                    CODE_CODE_C => set = CodeSet::C,
                    CODE_FNC_4_A if is_a => press_fnc4(&mut fnc4_pending, &mut upper_latched),
                    CODE_FNC_4_B if !is_a => press_fnc4(&mut fnc4_pending, &mut upper_latched),
                    CODE_CODE_B => set = CodeSet::B,
                    CODE_CODE_A => set = CodeSet::A,
                    _ => return None,
                }
            }
            CodeSet::C => match code {
                0..=99 => {
                    if code < 10 {
                        out.push('0');
                    }
                    out.push_str(&code.to_string());
                }
                CODE_FNC_1 => {
                    if index > 0 {
                        out.push(GROUP_SEPARATOR);
                    }
                }
                CODE_CODE_B => set = CodeSet::B,
                CODE_CODE_A => set = CodeSet::A,
                _ => return None,
            },
        }
    }
    Some(out)
}

impl LinearReader for Code128Reader {
    fn symbologies(&self) -> &'static [Symbology] {
        &[Symbology::Code128]
    }

    fn quiet_zone(&self) -> f32 {
        5.0
    }

    fn match_start(&self, runs: &[u32]) -> Option<f32> {
        Self::match_start_symbol(runs)?;
        Some(runs[..6].iter().sum::<u32>() as f32 / 11.0)
    }

    fn decode(&self, runs: &[u32], formats: SymbologySet) -> Option<Barcode> {
        if !formats.contains(Symbology::Code128) {
            return None;
        }
        let (codes, variances) = Self::read_codes(runs)?;
        if !Self::checksum_ok(&codes) {
            return None;
        }
        let values = &codes[1..codes.len() - 1];
        let text = decode_values(codes[0], values)?;
        if text.is_empty() {
            return None;
        }
        Some(Barcode::from_text(
            text,
            Symbology::Code128,
            confidence_from_variance(&variances),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synth::code128::{Code128Set, encode};

    fn runs_for(text: &str, scale: u32) -> Vec<u32> {
        encode(text)
            .expect("encodable")
            .into_iter()
            .map(|w| w * scale)
            .collect()
    }

    #[test]
    fn test_patterns_are_eleven_modules() {
        assert!(PATTERNS.iter().all(|p| p.iter().sum::<u32>() == 11));
    }

    #[test]
    fn test_decode_mixed_case_text() {
        let runs = runs_for("ImageSharpBarcodeReader", 2);
        let barcode = Code128Reader
            .decode(&runs, SymbologySet::all())
            .expect("decodes");
        assert_eq!(barcode.text, "ImageSharpBarcodeReader");
        assert_eq!(barcode.symbology, Symbology::Code128);
        assert!(barcode.confidence > 0.99);
    }

    #[test]
    fn test_decode_digits_in_set_c() {
        let runs = runs_for("12345678", 3);
        // start C + 4 pairs + check + stop + final bar
        assert_eq!(runs.len(), 6 * 7 + 1);
        let barcode = Code128Reader
            .decode(&runs, SymbologySet::all())
            .expect("decodes");
        assert_eq!(barcode.text, "12345678");
    }

    #[test]
    fn test_checksum_failure_is_rejected() {
        let mut codes = vec![START_B, 33, 34, 0];
        let sum = START_B + 33 + 34 * 2;
        codes[3] = (sum + 1) % 103;
        assert!(!Code128Reader::checksum_ok(&codes));
        codes[3] = sum % 103;
        assert!(Code128Reader::checksum_ok(&codes));
    }

    #[test]
    fn test_tampered_symbol_fails() {
        let mut runs = runs_for("HELLO", 2);
        // swap two elements of the first data symbol
        runs.swap(6, 7);
        assert!(
            Code128Reader
                .decode(&runs, SymbologySet::all())
                .is_none_or(|b| b.text != "HELLO")
        );
    }

    #[test]
    fn test_not_reported_when_excluded() {
        let runs = runs_for("HELLO", 2);
        assert!(
            Code128Reader
                .decode(&runs, SymbologySet::only(Symbology::Ean13))
                .is_none()
        );
    }

    #[test]
    fn test_match_start_module_size() {
        let runs = runs_for("AB", 3);
        let module = Code128Reader.match_start(&runs).expect("start guard");
        assert!((module - 3.0).abs() < 1e-3);
        assert!(Code128Reader.match_start(&[3, 3, 3, 3, 3, 3]).is_none());
    }

    #[test]
    fn test_values_with_shift_and_fnc() {
        // set A: 'A', SHIFT then 'a' from set B, FNC1 separator, 'B'
        let text = decode_values(START_A, &[33, CODE_SHIFT, 65, CODE_FNC_1, 34]).expect("text");
        assert_eq!(text, "Aa\u{1d}B");
        // control character in set A
        assert_eq!(decode_values(START_A, &[77]).as_deref(), Some("\r"));
        // set C then switch to B
        assert_eq!(
            decode_values(START_C, &[1, 23, CODE_CODE_B, 33]).as_deref(),
            Some("0123A")
        );
        // leading FNC1 marks GS1 data and is not part of the text
        assert_eq!(decode_values(START_C, &[CODE_FNC_1, 10]).as_deref(), Some("10"));
    }

    #[test]
    fn test_fnc4_extends_to_latin1() {
        // FNC4 in set B shifts the next character by 128
        let text = decode_values(START_B, &[CODE_FNC_4_B, 33, 33]).expect("text");
        assert_eq!(text, "\u{c1}A");
    }

    #[test]
    fn test_explicit_set_encoding() {
        let runs: Vec<u32> = crate::synth::code128::encode_with_set("ABC", Code128Set::A)
            .expect("encodable");
        let barcode = Code128Reader
            .decode(&runs, SymbologySet::all())
            .expect("decodes");
        assert_eq!(barcode.text, "ABC");
    }
}
