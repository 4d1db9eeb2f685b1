//! Numeric mode decoder (mode 0001)
//! Groups of 3 digits = 10 bits, 2 digits = 7 bits, 1 digit = 4 bits

use super::BitReader;

/// Reads numeric mode segments.
pub struct NumericDecoder;

impl NumericDecoder {
    /// Decode `character_count` digits. Groups that overflow their digit
    /// count (e.g. 1000 in 10 bits) reject the segment.
    pub fn decode(reader: &mut BitReader<'_>, character_count: usize) -> Option<String> {
        let mut result = String::with_capacity(character_count);
        let mut chars_remaining = character_count;

        while chars_remaining > 0 {
            let group_size = chars_remaining.min(3);
            let (bits_needed, limit) = match group_size {
                3 => (10, 1000),
                2 => (7, 100),
                _ => (4, 10),
            };
            let value = reader.read_bits(bits_needed)?;
            if value >= limit {
                return None;
            }
            result.push_str(&format!("{value:0width$}", width = group_size));
            chars_remaining -= group_size;
        }

        Some(result)
    }
}

#[cfg(test)]
mod tests {
    use super::super::bits_of;
    use super::*;

    #[test]
    fn test_numeric_decode() {
        // "01234567": 012 / 345 / 67
        let mut bits = bits_of(12, 10);
        bits.extend(bits_of(345, 10));
        bits.extend(bits_of(67, 7));
        let mut reader = BitReader::new(&bits);
        assert_eq!(
            NumericDecoder::decode(&mut reader, 8).as_deref(),
            Some("01234567")
        );
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn test_numeric_rejects_overflowing_group() {
        let bits = bits_of(1017, 10);
        let mut reader = BitReader::new(&bits);
        assert!(NumericDecoder::decode(&mut reader, 3).is_none());
    }
}
