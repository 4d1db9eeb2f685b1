//! Kanji mode decoder (mode 1000)

use super::BitReader;

/// Reads kanji mode segments.
pub struct KanjiDecoder;

impl KanjiDecoder {
    /// Rebuild the Shift JIS byte pairs of `character_count` characters.
    pub fn decode(reader: &mut BitReader<'_>, character_count: usize) -> Option<Vec<u8>> {
        let mut sjis = Vec::with_capacity(character_count * 2);
        for _ in 0..character_count {
            let value = reader.read_bits(13)?;
            let mut code = ((value / 0xC0) << 8) | (value % 0xC0);
            code += if code < 0x1F00 { 0x8140 } else { 0xC140 };
            sjis.push((code >> 8) as u8);
            sjis.push((code & 0xFF) as u8);
        }
        Some(sjis)
    }
}

#[cfg(test)]
mod tests {
    use super::super::bits_of;
    use super::*;

    #[test]
    fn test_kanji_values() {
        // 0x935F and 0xE4AA are the two reference characters of the standard
        let mut bits = bits_of(0x0D9F, 13);
        bits.extend(bits_of(0x1AAA, 13));
        let mut reader = BitReader::new(&bits);
        assert_eq!(
            KanjiDecoder::decode(&mut reader, 2),
            Some(vec![0x93, 0x5F, 0xE4, 0xAA])
        );
    }
}
