//! Code 39 symbol synthesis.

use crate::decoder::oned::code39::{ALPHABET, ASTERISK_ENCODING, CHARACTER_ENCODINGS};

/// Element widths for `*text*` with `narrow`/`wide` widths and one narrow
/// gap between characters. `None` when a character is outside the
/// standard alphabet.
pub fn encode(text: &str, narrow: u32, wide: u32) -> Option<Vec<u32>> {
    let mut encodings = Vec::with_capacity(text.len() + 2);
    encodings.push(ASTERISK_ENCODING);
    for b in text.bytes() {
        let index = ALPHABET.iter().position(|&a| a == b)?;
        encodings.push(CHARACTER_ENCODINGS[index]);
    }
    encodings.push(ASTERISK_ENCODING);

    let mut runs = Vec::with_capacity(encodings.len() * 10);
    for (i, pattern) in encodings.into_iter().enumerate() {
        if i > 0 {
            runs.push(narrow);
        }
        runs.extend((0..9).rev().map(|bit| {
            if pattern & (1 << bit) != 0 { wide } else { narrow }
        }));
    }
    Some(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout() {
        let runs = encode("A", 1, 3).unwrap();
        // three characters and two gaps
        assert_eq!(runs.len(), 3 * 9 + 2);
        // '*' is N W N N W N W N N
        assert_eq!(&runs[..9], &[1, 3, 1, 1, 3, 1, 3, 1, 1]);
        assert_eq!(runs[9], 1);
    }

    #[test]
    fn test_lower_case_is_not_encodable() {
        assert!(encode("abc", 1, 3).is_none());
        assert!(encode("ABC", 1, 3).is_some());
    }
}
