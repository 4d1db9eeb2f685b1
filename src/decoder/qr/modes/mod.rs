//! Segment decoders for the QR data modes.
//!
//! - Numeric: digits packed three per 10 bits
//! - Alphanumeric: 45-character set packed two per 11 bits
//! - Byte: raw 8-bit data, interpreted later through the active ECI
//! - Kanji: 13-bit Shift JIS values

pub mod alphanumeric;
pub mod byte;
pub mod kanji;
pub mod numeric;

/// MSB-first reader over a decoded bit sequence.
pub struct BitReader<'a> {
    bits: &'a [bool],
    idx: usize,
}

impl<'a> BitReader<'a> {
    /// Start at the first bit.
    pub fn new(bits: &'a [bool]) -> Self {
        Self { bits, idx: 0 }
    }

    /// Bits not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bits.len().saturating_sub(self.idx)
    }

    /// Next `n` bits as an integer; `None` past the end.
    pub fn read_bits(&mut self, n: usize) -> Option<u32> {
        if n > 32 || self.idx + n > self.bits.len() {
            return None;
        }
        let mut val = 0u32;
        for _ in 0..n {
            val = (val << 1) | (self.bits[self.idx] as u32);
            self.idx += 1;
        }
        Some(val)
    }
}

#[cfg(test)]
pub(crate) fn bits_of(value: u32, width: usize) -> Vec<bool> {
    (0..width).rev().map(|i| (value >> i) & 1 == 1).collect()
}
