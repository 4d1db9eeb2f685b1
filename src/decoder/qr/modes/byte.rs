//! Byte mode decoder (mode 0100) for 8-bit data

use encoding_rs::SHIFT_JIS;

use super::BitReader;

/// Character set selected by an ECI designator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Charset {
    /// No ECI seen: UTF-8 when valid, otherwise ISO-8859-1
    Guess,
    /// ECI 1 or 3
    Latin1,
    /// ECI 26
    Utf8,
    /// ECI 20, and every Kanji mode segment
    ShiftJis,
}

impl Charset {
    /// Map an ECI assignment number; unsupported values fall back to guessing.
    pub fn from_eci(eci: u32) -> Self {
        match eci {
            1 | 3 => Charset::Latin1,
            20 => Charset::ShiftJis,
            26 => Charset::Utf8,
            _ => Charset::Guess,
        }
    }

    /// Interpret `bytes`; `None` when the declared charset does not fit.
    pub fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Charset::Utf8 => String::from_utf8(bytes.to_vec()).ok(),
            Charset::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
            Charset::ShiftJis => SHIFT_JIS
                .decode_without_bom_handling_and_without_replacement(bytes)
                .map(|text| text.into_owned()),
            Charset::Guess => Some(match std::str::from_utf8(bytes) {
                Ok(s) => s.to_string(),
                Err(_) => bytes.iter().map(|&b| b as char).collect(),
            }),
        }
    }
}

/// Reads byte mode segments.
pub struct ByteDecoder;

impl ByteDecoder {
    /// Read `character_count` raw bytes.
    pub fn decode(reader: &mut BitReader<'_>, character_count: usize) -> Option<Vec<u8>> {
        (0..character_count)
            .map(|_| reader.read_bits(8).map(|b| b as u8))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::super::bits_of;
    use super::*;

    #[test]
    fn test_byte_decode() {
        let mut bits = bits_of(0x48, 8);
        bits.extend(bits_of(0x49, 8));
        let mut reader = BitReader::new(&bits);
        let bytes = ByteDecoder::decode(&mut reader, 2).unwrap();
        assert_eq!(Charset::Guess.decode(&bytes).as_deref(), Some("HI"));
        assert!(ByteDecoder::decode(&mut reader, 1).is_none());
    }

    #[test]
    fn test_charsets() {
        let latin = [0x63, 0x61, 0x66, 0xE9];
        assert_eq!(Charset::Guess.decode(&latin).as_deref(), Some("café"));
        assert_eq!(Charset::Latin1.decode(&latin).as_deref(), Some("café"));
        assert!(Charset::Utf8.decode(&latin).is_none());
        let utf8 = "café".as_bytes();
        assert_eq!(Charset::Guess.decode(utf8).as_deref(), Some("café"));
        assert_eq!(Charset::from_eci(26), Charset::Utf8);
    }

    #[test]
    fn test_shift_jis_eci() {
        assert_eq!(Charset::from_eci(20), Charset::ShiftJis);
        let bytes = [0x93, 0x5F, 0xE4, 0xAA];
        assert_eq!(Charset::ShiftJis.decode(&bytes).as_deref(), Some("点茗"));
        // lone lead byte
        assert!(Charset::ShiftJis.decode(&[0x93]).is_none());
    }
}
