//! Code 128 symbol synthesis.

use crate::decoder::oned::code128::PATTERNS;

const START_A: usize = 103;
const START_B: usize = 104;
const START_C: usize = 105;
const STOP: usize = 106;

/// Code 128 character set used for a whole symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Code128Set {
    /// Upper case, digits, punctuation and control characters
    A,
    /// Printable ASCII
    B,
    /// Digit pairs
    C,
}

/// Module widths (bar first, no quiet zone) for `text` in set C when it is
/// an even run of digits, set B otherwise.
pub fn encode(text: &str) -> Option<Vec<u32>> {
    let all_digits = !text.is_empty() && text.bytes().all(|b| b.is_ascii_digit());
    if all_digits && text.len() % 2 == 0 {
        encode_with_set(text, Code128Set::C)
    } else {
        encode_with_set(text, Code128Set::B)
    }
}

/// Module widths for `text` encoded entirely in `set`. `None` when a
/// character is outside the set or the text is empty.
pub fn encode_with_set(text: &str, set: Code128Set) -> Option<Vec<u32>> {
    if text.is_empty() {
        return None;
    }
    let (start, values) = match set {
        Code128Set::A => (
            START_A,
            text.bytes()
                .map(|b| match b {
                    0..=31 => Some(b as usize + 64),
                    32..=95 => Some(b as usize - 32),
                    _ => None,
                })
                .collect::<Option<Vec<_>>>()?,
        ),
        Code128Set::B => (
            START_B,
            text.bytes()
                .map(|b| (32..=127).contains(&b).then(|| b as usize - 32))
                .collect::<Option<Vec<_>>>()?,
        ),
        Code128Set::C => {
            let bytes = text.as_bytes();
            if bytes.len() % 2 != 0 || !bytes.iter().all(u8::is_ascii_digit) {
                return None;
            }
            let pairs = bytes
                .chunks_exact(2)
                .map(|p| ((p[0] - b'0') * 10 + (p[1] - b'0')) as usize)
                .collect();
            (START_C, pairs)
        }
    };

    let checksum = values
        .iter()
        .enumerate()
        .fold(start, |sum, (i, &v)| sum + v * (i + 1))
        % 103;

    let mut runs = Vec::with_capacity((values.len() + 3) * 6 + 1);
    for code in std::iter::once(start)
        .chain(values)
        .chain([checksum, STOP])
    {
        runs.extend_from_slice(&PATTERNS[code]);
    }
    // terminating bar
    runs.push(2);
    Some(runs)
}
