//! Format and version information: the BCH-protected headers of a QR symbol.
use crate::models::{BitMatrix, ECLevel, MaskPattern};

const FORMAT_GENERATOR: u32 = 0x537;
const FORMAT_XOR_MASK: u16 = 0x5412;
const VERSION_GENERATOR: u32 = 0x1F25;
const MAX_CORRECTABLE_BITS: u32 = 3;

// (x, y) of format bit i (LSB first) in the copy around the top-left finder
const TOP_LEFT_COPY: [(usize, usize); 15] = [
    (8, 0),
    (8, 1),
    (8, 2),
    (8, 3),
    (8, 4),
    (8, 5),
    (8, 7),
    (8, 8),
    (7, 8),
    (5, 8),
    (4, 8),
    (3, 8),
    (2, 8),
    (1, 8),
    (0, 8),
];

/// Remainder of `value * x^deg(generator)` divided by `generator` over GF(2).
pub fn bch_remainder(value: u32, generator: u32) -> u32 {
    let degree = 31 - generator.leading_zeros();
    let mut remainder = value << degree;
    while remainder != 0 {
        let top = 31 - remainder.leading_zeros();
        if top < degree {
            break;
        }
        remainder ^= generator << (top - degree);
    }
    remainder
}

/// Error correction level and mask read from the 15-bit format field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatInfo {
    /// Error correction level
    pub ec_level: ECLevel,
    /// Data mask
    pub mask_pattern: MaskPattern,
}

impl FormatInfo {
    /// Pair a level with a mask.
    pub fn new(ec_level: ECLevel, mask_pattern: MaskPattern) -> Self {
        Self {
            ec_level,
            mask_pattern,
        }
    }

    /// The masked 15-bit codeword as stored in the symbol.
    pub fn codeword(&self) -> u16 {
        let data = ((self.ec_level.format_bits() << 3) | self.mask_pattern.bits()) as u32;
        (((data << 10) | bch_remainder(data, FORMAT_GENERATOR)) as u16) ^ FORMAT_XOR_MASK
    }

    /// Nearest valid format within the BCH correction radius.
    pub fn from_codeword(bits: u16) -> Option<Self> {
        Self::closest(&[bits]).map(|(info, _)| info)
    }

    /// Read both copies and keep whichever is closer to a valid codeword.
    pub fn read(matrix: &BitMatrix) -> Option<Self> {
        let size = matrix.width();
        if size < 21 {
            return None;
        }
        let mut first = 0u16;
        let mut second = 0u16;
        for i in 0..15 {
            let (x, y) = TOP_LEFT_COPY[i];
            first |= (matrix.get(x, y) as u16) << i;
            let (x2, y2) = Self::second_copy_position(size, i);
            second |= (matrix.get(x2, y2) as u16) << i;
        }
        Self::closest(&[first, second]).map(|(info, _)| info)
    }

    /// Draw both copies into a symbol of side `matrix.width()`.
    pub fn write(&self, matrix: &mut BitMatrix) {
        let size = matrix.width();
        let bits = self.codeword();
        for i in 0..15 {
            let bit = (bits >> i) & 1 == 1;
            let (x, y) = TOP_LEFT_COPY[i];
            matrix.set(x, y, bit);
            let (x2, y2) = Self::second_copy_position(size, i);
            matrix.set(x2, y2, bit);
        }
    }

    fn second_copy_position(size: usize, i: usize) -> (usize, usize) {
        if i < 8 {
            (size - 1 - i, 8)
        } else {
            (8, size - 15 + i)
        }
    }

    fn closest(readings: &[u16]) -> Option<(Self, u32)> {
        let mut best: Option<(Self, u32)> = None;
        for data in 0u8..32 {
            let info = Self::new(
                ECLevel::from_format_bits(data >> 3),
                MaskPattern::from_bits(data),
            );
            let code = info.codeword();
            for &reading in readings {
                let distance = (code ^ reading).count_ones();
                if best.is_none_or(|(_, d)| distance < d) {
                    best = Some((info, distance));
                }
            }
        }
        best.filter(|(_, distance)| *distance <= MAX_CORRECTABLE_BITS)
    }
}

/// Version field carried by symbols of version 7 and above.
pub struct VersionInfo;

impl VersionInfo {
    /// The 18-bit codeword for `version`.
    pub fn codeword(version: u8) -> u32 {
        let v = version as u32;
        (v << 12) | bch_remainder(v, VERSION_GENERATOR)
    }

    /// Read both copies, corrected to the nearest valid version.
    pub fn read(matrix: &BitMatrix) -> Option<u8> {
        let size = matrix.width();
        if size < 45 {
            return None;
        }
        let mut top_right = 0u32;
        let mut bottom_left = 0u32;
        for i in 0..6 {
            for j in 0..3 {
                let k = i * 3 + j;
                top_right |= (matrix.get(size - 11 + j, i) as u32) << k;
                bottom_left |= (matrix.get(i, size - 11 + j) as u32) << k;
            }
        }

        let mut best: Option<(u8, u32)> = None;
        for version in 7u8..=40 {
            let code = Self::codeword(version);
            for reading in [top_right, bottom_left] {
                let distance = (code ^ reading).count_ones();
                if best.is_none_or(|(_, d)| distance < d) {
                    best = Some((version, distance));
                }
            }
        }
        best.filter(|(_, d)| *d <= MAX_CORRECTABLE_BITS)
            .map(|(version, _)| version)
    }

    /// Draw both copies for `version` (no-op below version 7).
    pub fn write(version: u8, matrix: &mut BitMatrix) {
        if version < 7 {
            return;
        }
        let size = matrix.width();
        let bits = Self::codeword(version);
        for i in 0..6 {
            for j in 0..3 {
                let bit = (bits >> (i * 3 + j)) & 1 == 1;
                matrix.set(i, size - 11 + j, bit);
                matrix.set(size - 11 + j, i, bit);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_format_codewords() {
        // M / mask 0 is all-zero data, so only the XOR mask remains
        assert_eq!(
            FormatInfo::new(ECLevel::M, MaskPattern::Pattern0).codeword(),
            0x5412
        );
        assert_eq!(
            FormatInfo::new(ECLevel::L, MaskPattern::Pattern0).codeword(),
            0x77C4
        );
        assert_eq!(
            FormatInfo::new(ECLevel::H, MaskPattern::Pattern7).codeword(),
            0x083B
        );
    }

    #[test]
    fn test_known_version_codeword() {
        assert_eq!(VersionInfo::codeword(7), 0x07C94);
        assert_eq!(VersionInfo::codeword(40), 0x28C69);
    }

    #[test]
    fn test_format_corrects_three_bit_errors() {
        let info = FormatInfo::new(ECLevel::Q, MaskPattern::Pattern5);
        let damaged = info.codeword() ^ 0b100_0000_0100_0001;
        assert_eq!(FormatInfo::from_codeword(damaged), Some(info));
    }

    #[test]
    fn test_format_write_then_read() {
        let mut matrix = BitMatrix::new(25, 25);
        let info = FormatInfo::new(ECLevel::H, MaskPattern::Pattern3);
        info.write(&mut matrix);
        assert_eq!(FormatInfo::read(&matrix), Some(info));

        // wipe the top-left copy; the second copy still answers
        for (x, y) in TOP_LEFT_COPY {
            matrix.set(x, y, false);
        }
        assert_eq!(FormatInfo::read(&matrix), Some(info));
    }

    #[test]
    fn test_version_write_then_read() {
        let size = 17 + 4 * 12;
        let mut matrix = BitMatrix::new(size, size);
        VersionInfo::write(12, &mut matrix);
        assert_eq!(VersionInfo::read(&matrix), Some(12));
        matrix.toggle(size - 11, 0);
        matrix.toggle(size - 10, 3);
        assert_eq!(VersionInfo::read(&matrix), Some(12));
    }
}
