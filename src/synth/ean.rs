//! EAN-13, UPC-A and EAN-8 symbol synthesis.

use crate::decoder::oned::ean::{
    FIRST_DIGIT_ENCODINGS, G_PATTERNS, L_PATTERNS, MIDDLE_PATTERN, START_END_PATTERN, check_digit,
};

fn digits(text: &str, count: usize) -> Option<Vec<u8>> {
    if text.len() != count || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(text.bytes().map(|b| b - b'0').collect())
}

/// Module widths for an EAN-13 from its first 12 digits; the check digit
/// is computed and appended.
pub fn encode_ean13(body: &str) -> Option<Vec<u32>> {
    let mut d = digits(body, 12)?;
    d.push(check_digit(&d));

    let parity = FIRST_DIGIT_ENCODINGS[d[0] as usize];
    let mut runs = Vec::with_capacity(59);
    runs.extend_from_slice(&START_END_PATTERN);
    for (i, &digit) in d[1..7].iter().enumerate() {
        let even = parity & (1 << (5 - i)) != 0;
        let table = if even { &G_PATTERNS } else { &L_PATTERNS };
        runs.extend_from_slice(&table[digit as usize]);
    }
    runs.extend_from_slice(&MIDDLE_PATTERN);
    for &digit in &d[7..] {
        runs.extend_from_slice(&L_PATTERNS[digit as usize]);
    }
    runs.extend_from_slice(&START_END_PATTERN);
    Some(runs)
}

/// Module widths for a UPC-A from its first 11 digits.
pub fn encode_upca(body: &str) -> Option<Vec<u32>> {
    encode_ean13(&format!("0{body}"))
}

/// Module widths for an EAN-8 from its first 7 digits.
pub fn encode_ean8(body: &str) -> Option<Vec<u32>> {
    let mut d = digits(body, 7)?;
    d.push(check_digit(&d));

    let mut runs = Vec::with_capacity(43);
    runs.extend_from_slice(&START_END_PATTERN);
    for &digit in &d[..4] {
        runs.extend_from_slice(&L_PATTERNS[digit as usize]);
    }
    runs.extend_from_slice(&MIDDLE_PATTERN);
    for &digit in &d[4..] {
        runs.extend_from_slice(&L_PATTERNS[digit as usize]);
    }
    runs.extend_from_slice(&START_END_PATTERN);
    Some(runs)
}
