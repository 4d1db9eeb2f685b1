//! Code 39 reader (standard 43-character alphabet, no check digit).

use super::{LinearReader, wide_elements};
use crate::models::{Barcode, Symbology, SymbologySet};

pub(crate) const ALPHABET: &[u8; 43] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ-. $/+%";

/// Nine elements per character, first bar in the highest bit, 1 = wide.
pub(crate) const CHARACTER_ENCODINGS: [u16; 43] = [
    0x034, 0x121, 0x061, 0x160, 0x031, 0x130, 0x070, 0x025, 0x124, 0x064, // 0-9
    0x109, 0x049, 0x148, 0x019, 0x118, 0x058, 0x00D, 0x10C, 0x04C, 0x01C, // A-J
    0x103, 0x043, 0x142, 0x013, 0x112, 0x052, 0x007, 0x106, 0x046, 0x016, // K-T
    0x181, 0x0C1, 0x1C0, 0x091, 0x190, 0x0D0, 0x085, 0x184, 0x0C4, 0x0A8, // U-$
    0x0A2, 0x08A, 0x02A, // /-%
];

/// The `*` start/stop character.
pub(crate) const ASTERISK_ENCODING: u16 = 0x094;

/// Reader for Code 39.
pub struct Code39Reader;

impl Code39Reader {
    fn character_pattern(runs: &[u32]) -> Option<u16> {
        if runs.len() != 9 {
            return None;
        }
        wide_elements(runs, 3).map(|mask| mask as u16)
    }

    fn pattern_to_char(pattern: u16) -> Option<u8> {
        CHARACTER_ENCODINGS
            .iter()
            .position(|&p| p == pattern)
            .map(|i| ALPHABET[i])
    }

    /// Inter-character gaps must look narrow next to the character.
    fn gap_ok(gap: u32, character: &[u32]) -> bool {
        let widest = character.iter().copied().max().unwrap_or(0);
        gap <= widest
    }
}

impl LinearReader for Code39Reader {
    fn symbologies(&self) -> &'static [Symbology] {
        &[Symbology::Code39]
    }

    fn quiet_zone(&self) -> f32 {
        5.0
    }

    fn match_start(&self, runs: &[u32]) -> Option<f32> {
        let start = runs.get(..9)?;
        if Self::character_pattern(start)? != ASTERISK_ENCODING {
            return None;
        }
        let wide = ASTERISK_ENCODING;
        let narrow: Vec<u32> = start
            .iter()
            .enumerate()
            .filter(|(i, _)| wide & (1 << (8 - i)) == 0)
            .map(|(_, &w)| w)
            .collect();
        Some(narrow.iter().sum::<u32>() as f32 / narrow.len() as f32)
    }

    fn decode(&self, runs: &[u32], formats: SymbologySet) -> Option<Barcode> {
        if !formats.contains(Symbology::Code39) {
            return None;
        }
        if Self::character_pattern(runs.get(..9)?)? != ASTERISK_ENCODING {
            return None;
        }

        let mut text = String::new();
        let mut pos = 9;
        loop {
            let gap = *runs.get(pos)?;
            let character = runs.get(pos + 1..pos + 10)?;
            if !Self::gap_ok(gap, character) {
                return None;
            }
            let pattern = Self::character_pattern(character)?;
            pos += 10;
            if pattern == ASTERISK_ENCODING {
                break;
            }
            text.push(Self::pattern_to_char(pattern)? as char);
        }

        if pos != runs.len() || text.is_empty() {
            return None;
        }
        Some(Barcode::from_text(text, Symbology::Code39, 0.9))
    }
}
