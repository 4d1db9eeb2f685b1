//! Alphanumeric mode decoder (mode 0010)
//! Character set: 0-9, A-Z, space, $%*+-./:

use super::BitReader;

/// Character for each 0..45 value.
pub const ALPHANUMERIC_TABLE: [char; 45] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I',
    'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', ' ', '$',
    '%', '*', '+', '-', '.', '/', ':',
];

/// Pairs = 11 bits, single = 6 bits
pub struct AlphanumericDecoder;

impl AlphanumericDecoder {
    /// Read `character_count` characters.
    pub fn decode(reader: &mut BitReader<'_>, character_count: usize) -> Option<String> {
        let mut result = String::with_capacity(character_count);
        let mut chars_remaining = character_count;

        while chars_remaining >= 2 {
            let value = reader.read_bits(11)? as usize;
            let (first, second) = (value / 45, value % 45);
            if first >= 45 {
                return None;
            }
            result.push(ALPHANUMERIC_TABLE[first]);
            result.push(ALPHANUMERIC_TABLE[second]);
            chars_remaining -= 2;
        }
        if chars_remaining == 1 {
            let value = reader.read_bits(6)? as usize;
            result.push(*ALPHANUMERIC_TABLE.get(value)?);
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::bits_of;
    use super::*;

    #[test]
    fn test_alphanumeric_decode() {
        // "A1" = 10 * 45 + 1 = 451, then "Z" = 35
        let mut bits = bits_of(451, 11);
        bits.extend(bits_of(35, 6));
        let mut reader = BitReader::new(&bits);
        assert_eq!(
            AlphanumericDecoder::decode(&mut reader, 3).as_deref(),
            Some("A1Z")
        );
    }

    #[test]
    fn test_alphanumeric_rejects_out_of_table() {
        let bits = bits_of(50, 6);
        let mut reader = BitReader::new(&bits);
        assert!(AlphanumericDecoder::decode(&mut reader, 1).is_none());
    }
}
