//! Interleaved 2 of 5 symbol synthesis.

use crate::decoder::oned::itf::DIGIT_PATTERNS;

/// Element widths for `digits` including the narrow start guard and the
/// wide-narrow-narrow end guard. `None` for an odd or empty digit string.
pub fn encode(digits: &str, narrow: u32, wide: u32) -> Option<Vec<u32>> {
    let bytes = digits.as_bytes();
    if bytes.is_empty() || bytes.len() % 2 != 0 || !bytes.iter().all(u8::is_ascii_digit) {
        return None;
    }
    let width = |pattern: u8, k: usize| {
        if pattern & (1 << (4 - k)) != 0 { wide } else { narrow }
    };

    let mut runs = vec![narrow; 4];
    for pair in bytes.chunks_exact(2) {
        let bars = DIGIT_PATTERNS[(pair[0] - b'0') as usize];
        let spaces = DIGIT_PATTERNS[(pair[1] - b'0') as usize];
        for k in 0..5 {
            runs.push(width(bars, k));
            runs.push(width(spaces, k));
        }
    }
    runs.extend_from_slice(&[wide, narrow, narrow]);
    Some(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let runs = encode("12", 1, 3).unwrap();
        assert_eq!(runs.len(), 4 + 10 + 3);
        // 1 = WNNNW on bars, 2 = NWNNW on spaces
        assert_eq!(&runs[4..14], &[3, 1, 1, 3, 1, 1, 1, 1, 3, 3]);
        assert_eq!(&runs[14..], &[3, 1, 1]);
    }
}
