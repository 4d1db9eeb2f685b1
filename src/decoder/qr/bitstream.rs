use super::function_mask::FunctionMask;
use crate::models::BitMatrix;

/// Walks data modules in placement order.
pub struct BitstreamExtractor;

impl BitstreamExtractor {
    /// (x, y) of every data module, in the order codeword bits are placed:
    /// two-column strips from the right edge, alternating upward and
    /// downward, skipping the vertical timing column.
    pub fn data_positions(func: &FunctionMask) -> Vec<(usize, usize)> {
        let dimension = func.size();
        let mut positions = Vec::with_capacity(func.data_modules_count());
        let mut upward = true;
        let mut col = dimension as isize - 1;

        while col > 0 {
            if col == 6 {
                col -= 1;
                continue;
            }
            for step in 0..dimension {
                let row = if upward { dimension - 1 - step } else { step };
                for c in [col as usize, col as usize - 1] {
                    if !func.is_function(c, row) {
                        positions.push((c, row));
                    }
                }
            }
            upward = !upward;
            col -= 2;
        }

        positions
    }

    /// Data bits of an unmasked symbol
    pub fn extract(matrix: &BitMatrix, func: &FunctionMask) -> Vec<bool> {
        Self::data_positions(func)
            .into_iter()
            .map(|(x, y)| matrix.get(x, y))
            .collect()
    }
}

/// Pack bits MSB first; a trailing partial byte is dropped.
pub fn bits_to_codewords(bits: &[bool]) -> Vec<u8> {
    bits.chunks_exact(8)
        .map(|chunk| chunk.iter().fold(0u8, |byte, &bit| (byte << 1) | bit as u8))
        .collect()
}
