//! QR symbol synthesis: byte-mode segments at the smallest version that
//! fits, Reed-Solomon blocks from the decoder's own tables, fixed mask.

use crate::decoder::qr::bitstream::BitstreamExtractor;
use crate::decoder::qr::format::{FormatInfo, VersionInfo};
use crate::decoder::qr::function_mask::{FunctionMask, alignment_pattern_centers};
use crate::decoder::qr::tables::{char_count_bits, data_codewords, ec_block_info, total_codewords};
use crate::decoder::qr::unmask::unmask;
use crate::decoder::reed_solomon::ReedSolomonEncoder;
use crate::models::{BitMatrix, ECLevel, LuminanceGrid, MaskPattern};

use super::raster;

const MODE_BYTE: u8 = 0b0100;

/// Builds a QR symbol carrying one byte-mode segment.
#[derive(Debug, Clone)]
pub struct QrBuilder {
    data: Vec<u8>,
    ec_level: ECLevel,
    mask: MaskPattern,
    min_version: u8,
}

impl QrBuilder {
    /// Level L, mask 3, smallest version that fits.
    pub fn new(text: &str) -> Self {
        Self::from_bytes(text.as_bytes())
    }

    /// Same as [`QrBuilder::new`] for arbitrary bytes.
    pub fn from_bytes(data: &[u8]) -> Self {
        Self {
            data: data.to_vec(),
            ec_level: ECLevel::L,
            mask: MaskPattern::Pattern3,
            min_version: 1,
        }
    }

    /// Error correction level
    pub fn ec_level(mut self, ec_level: ECLevel) -> Self {
        self.ec_level = ec_level;
        self
    }

    /// Data mask
    pub fn mask(mut self, mask: MaskPattern) -> Self {
        self.mask = mask;
        self
    }

    /// Never pick a version below `version`.
    pub fn min_version(mut self, version: u8) -> Self {
        self.min_version = version.clamp(1, 40);
        self
    }

    /// Version the payload will be encoded at, if it fits at all.
    pub fn version(&self) -> Option<u8> {
        (self.min_version..=40).find(|&v| {
            let count_bits = char_count_bits(MODE_BYTE, v);
            let needed = 4 + count_bits + 8 * self.data.len();
            self.data.len() < (1 << count_bits)
                && data_codewords(v, self.ec_level).is_some_and(|cap| needed <= cap * 8)
        })
    }

    /// The module grid, without quiet zone. `None` if the payload does not
    /// fit in version 40.
    pub fn build_modules(&self) -> Option<BitMatrix> {
        let version = self.version()?;
        let codewords = self.codewords(version)?;
        let func = FunctionMask::new(version);
        let size = func.size();

        let mut matrix = BitMatrix::new(size, size);
        draw_function_patterns(&mut matrix, version);

        let bits = codewords
            .iter()
            .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1));
        for ((x, y), bit) in BitstreamExtractor::data_positions(&func).into_iter().zip(bits) {
            matrix.set(x, y, bit);
        }
        unmask(&mut matrix, &self.mask, &func);

        FormatInfo::new(self.ec_level, self.mask).write(&mut matrix);
        VersionInfo::write(version, &mut matrix);
        Some(matrix)
    }

    /// Render with a four-module quiet zone at `scale` pixels per module.
    pub fn render(&self, scale: usize) -> Option<LuminanceGrid> {
        self.build_modules()
            .map(|modules| raster::render_matrix(&modules, scale, 4))
    }

    /// Interleaved data and error correction codewords.
    fn codewords(&self, version: u8) -> Option<Vec<u8>> {
        let info = ec_block_info(version, self.ec_level)?;
        let data_total = data_codewords(version, self.ec_level)?;

        let mut bits = BitBuffer::default();
        bits.push(MODE_BYTE as u32, 4);
        bits.push(self.data.len() as u32, char_count_bits(MODE_BYTE, version));
        for &byte in &self.data {
            bits.push(byte as u32, 8);
        }
        let capacity = data_total * 8;
        let terminator = (capacity - bits.len()).min(4);
        bits.push(0, terminator);
        let mut data = bits.into_bytes();
        for pad in [0xEC, 0x11].into_iter().cycle() {
            if data.len() >= data_total {
                break;
            }
            data.push(pad);
        }

        let num_long = data_total % info.num_blocks;
        let num_short = info.num_blocks - num_long;
        let short_len = data_total / info.num_blocks;
        let rs = ReedSolomonEncoder::new(info.ecc_per_block);

        let mut blocks = Vec::with_capacity(info.num_blocks);
        let mut offset = 0;
        for b in 0..info.num_blocks {
            let len = if b < num_short { short_len } else { short_len + 1 };
            let block = &data[offset..offset + len];
            offset += len;
            blocks.push((block.to_vec(), rs.ecc(block)));
        }

        let mut out = Vec::with_capacity(total_codewords(version));
        for i in 0..=short_len {
            out.extend(blocks.iter().filter_map(|(d, _)| d.get(i).copied()));
        }
        for i in 0..info.ecc_per_block {
            out.extend(blocks.iter().map(|(_, e)| e[i]));
        }
        Some(out)
    }
}

fn draw_function_patterns(matrix: &mut BitMatrix, version: u8) {
    let size = matrix.width();
    for (ox, oy) in [(0, 0), (size - 7, 0), (0, size - 7)] {
        for dy in 0..7 {
            for dx in 0..7 {
                let edge = dx == 0 || dy == 0 || dx == 6 || dy == 6;
                let core = (2..=4).contains(&dx) && (2..=4).contains(&dy);
                matrix.set(ox + dx, oy + dy, edge || core);
            }
        }
    }
    for i in 8..size - 8 {
        matrix.set(i, 6, i % 2 == 0);
        matrix.set(6, i, i % 2 == 0);
    }
    for (cx, cy) in alignment_pattern_centers(version) {
        for dy in 0..5 {
            for dx in 0..5 {
                let edge = dx == 0 || dy == 0 || dx == 4 || dy == 4;
                matrix.set(cx + dx - 2, cy + dy - 2, edge || (dx == 2 && dy == 2));
            }
        }
    }
    matrix.set(8, size - 8, true);
}

/// MSB-first bit accumulator.
#[derive(Default)]
struct BitBuffer {
    bits: Vec<bool>,
}

impl BitBuffer {
    fn push(&mut self, value: u32, count: usize) {
        self.bits
            .extend((0..count).rev().map(|i| (value >> i) & 1 == 1));
    }

    fn len(&self) -> usize {
        self.bits.len()
    }

    fn into_bytes(self) -> Vec<u8> {
        self.bits
            .chunks(8)
            .map(|chunk| {
                chunk
                    .iter()
                    .enumerate()
                    .fold(0u8, |byte, (i, &bit)| byte | ((bit as u8) << (7 - i)))
            })
            .collect()
    }
}
