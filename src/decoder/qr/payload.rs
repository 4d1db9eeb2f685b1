use super::modes::{
    BitReader, alphanumeric::AlphanumericDecoder, byte::ByteDecoder, byte::Charset,
    kanji::KanjiDecoder, numeric::NumericDecoder,
};
use super::tables::{char_count_bits, ec_block_info};
use crate::decoder::reed_solomon::ReedSolomonDecoder;
use crate::models::ECLevel;

/// Data codewords after error correction, plus how many bytes were repaired
/// and the correction capacity that was available.
pub struct CorrectedData {
    /// Data codewords in block order
    pub data: Vec<u8>,
    /// Codewords repaired across all blocks
    pub corrected: usize,
    /// Codewords that could have been repaired
    pub capacity: usize,
}

/// Split interleaved codewords into blocks and run Reed-Solomon on each.
pub fn deinterleave_and_correct(
    codewords: &[u8],
    version: u8,
    ec_level: ECLevel,
) -> Option<CorrectedData> {
    let info = ec_block_info(version, ec_level)?;
    let total = codewords.len();
    let ecc_total = info.num_blocks * info.ecc_per_block;
    let data_total = total.checked_sub(ecc_total)?;
    if data_total == 0 {
        return None;
    }

    // short blocks come first; long blocks carry one extra data codeword
    let num_long_blocks = data_total % info.num_blocks;
    let num_short_blocks = info.num_blocks - num_long_blocks;
    let short_len = data_total / info.num_blocks;
    let data_len = |b: usize| {
        if b < num_short_blocks {
            short_len
        } else {
            short_len + 1
        }
    };

    let mut blocks: Vec<Vec<u8>> = (0..info.num_blocks)
        .map(|_| Vec::with_capacity(short_len + 1 + info.ecc_per_block))
        .collect();

    let mut stream = codewords.iter().copied();
    for i in 0..=short_len {
        for (b, block) in blocks.iter_mut().enumerate() {
            if i < data_len(b) {
                block.push(stream.next()?);
            }
        }
    }
    for _ in 0..info.ecc_per_block {
        for block in blocks.iter_mut() {
            block.push(stream.next()?);
        }
    }

    let rs = ReedSolomonDecoder::new(info.ecc_per_block);
    let mut data = Vec::with_capacity(data_total);
    let mut corrected = 0;
    for (b, block) in blocks.iter_mut().enumerate() {
        corrected += rs.decode(block).ok()?;
        data.extend_from_slice(&block[..data_len(b)]);
    }

    Some(CorrectedData {
        data,
        corrected,
        capacity: info.num_blocks * (info.ecc_per_block / 2),
    })
}

/// Decode the segment stream. Returns the byte-level payload and its text.
pub fn decode_payload(data_codewords: &[u8], version: u8) -> Option<(Vec<u8>, String)> {
    let bits: Vec<bool> = data_codewords
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        .collect();
    let mut reader = BitReader::new(&bits);
    let mut data = Vec::new();
    let mut content = String::new();
    let mut charset = Charset::Guess;

    while reader.remaining() >= 4 {
        let mode = reader.read_bits(4)? as u8;
        match mode {
            // terminator
            0b0000 => break,
            0b0001 => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                let digits = NumericDecoder::decode(&mut reader, count)?;
                data.extend_from_slice(digits.as_bytes());
                content.push_str(&digits);
            }
            0b0010 => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                let text = AlphanumericDecoder::decode(&mut reader, count)?;
                data.extend_from_slice(text.as_bytes());
                content.push_str(&text);
            }
            0b0100 => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                let bytes = ByteDecoder::decode(&mut reader, count)?;
                content.push_str(&charset.decode(&bytes)?);
                data.extend_from_slice(&bytes);
            }
            0b1000 => {
                let count = reader.read_bits(char_count_bits(mode, version))? as usize;
                let sjis = KanjiDecoder::decode(&mut reader, count)?;
                content.push_str(&Charset::ShiftJis.decode(&sjis)?);
                data.extend_from_slice(&sjis);
            }
            0b0111 => {
                charset = Charset::from_eci(read_eci(&mut reader)?);
            }
            // structured append: sequence and parity, no payload
            0b0011 => {
                reader.read_bits(16)?;
            }
            // FNC1 in first position carries nothing; second position an application id
            0b0101 => {}
            0b1001 => {
                reader.read_bits(8)?;
            }
            _ => return None,
        }
    }

    Some((data, content))
}

fn read_eci(reader: &mut BitReader<'_>) -> Option<u32> {
    let first = reader.read_bits(8)?;
    if first & 0x80 == 0 {
        Some(first & 0x7F)
    } else if first & 0xC0 == 0x80 {
        Some(((first & 0x3F) << 8) | reader.read_bits(8)?)
    } else if first & 0xE0 == 0xC0 {
        Some(((first & 0x1F) << 16) | reader.read_bits(16)?)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::reed_solomon::ReedSolomonEncoder;

    fn pack(bits: &[(u32, usize)]) -> Vec<u8> {
        let mut stream: Vec<bool> = bits
            .iter()
            .flat_map(|&(value, width)| (0..width).rev().map(move |i| (value >> i) & 1 == 1))
            .collect();
        while stream.len() % 8 != 0 {
            stream.push(false);
        }
        stream
            .chunks(8)
            .map(|c| c.iter().fold(0u8, |b, &bit| (b << 1) | bit as u8))
            .collect()
    }

    #[test]
    fn test_decode_mixed_segments() {
        // numeric "123", alphanumeric "AB", byte "x", terminator
        let codewords = pack(&[
            (0b0001, 4),
            (3, 10),
            (123, 10),
            (0b0010, 4),
            (2, 9),
            (10 * 45 + 11, 11),
            (0b0100, 4),
            (1, 8),
            (b'x' as u32, 8),
            (0, 4),
        ]);
        let (data, text) = decode_payload(&codewords, 1).unwrap();
        assert_eq!(text, "123ABx");
        assert_eq!(data, b"123ABx");
    }

    #[test]
    fn test_eci_selects_latin1() {
        let codewords = pack(&[(0b0111, 4), (3, 8), (0b0100, 4), (1, 8), (0xE9, 8), (0, 4)]);
        let (_, text) = decode_payload(&codewords, 1).unwrap();
        assert_eq!(text, "é");
    }

    #[test]
    fn test_kanji_segment_text() {
        let codewords = pack(&[(0b1000, 4), (2, 8), (0x0D9F, 13), (0x1AAA, 13), (0, 4)]);
        let (data, text) = decode_payload(&codewords, 1).unwrap();
        assert_eq!(text, "点茗");
        assert_eq!(data, vec![0x93, 0x5F, 0xE4, 0xAA]);
    }

    #[test]
    fn test_invalid_kanji_is_rejected() {
        // 0x003F rebuilds as 0x81 0x7F; 0x7F is never a Shift JIS trail byte
        let codewords = pack(&[(0b1000, 4), (1, 8), (0x003F, 13), (0, 4)]);
        assert!(decode_payload(&codewords, 1).is_none());
    }

    #[test]
    fn test_unknown_mode_is_rejected() {
        let codewords = pack(&[(0b1111, 4), (0, 12)]);
        assert!(decode_payload(&codewords, 1).is_none());
    }

    #[test]
    fn test_deinterleave_two_block_layout() {
        // 5-Q: 4 blocks, 18 ecc each, 15/15/16/16 data codewords
        let data: Vec<u8> = (0..62u8).collect();
        let encoder = ReedSolomonEncoder::new(18);
        let lens = [15usize, 15, 16, 16];
        let mut blocks = Vec::new();
        let mut offset = 0;
        for len in lens {
            blocks.push(encoder.encode(&data[offset..offset + len]));
            offset += len;
        }
        let mut interleaved = Vec::new();
        for i in 0..16 {
            for (b, block) in blocks.iter().enumerate() {
                if i < lens[b] {
                    interleaved.push(block[i]);
                }
            }
        }
        for i in 0..18 {
            for (b, block) in blocks.iter().enumerate() {
                interleaved.push(block[lens[b] + i]);
            }
        }
        interleaved[7] ^= 0x44;

        let corrected = deinterleave_and_correct(&interleaved, 5, ECLevel::Q).unwrap();
        assert_eq!(corrected.data, data);
        assert_eq!(corrected.corrected, 1);
        assert_eq!(corrected.capacity, 36);
    }
}
