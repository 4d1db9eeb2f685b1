//! QR code decoding from a sampled module grid.
//!
//! The sampler hands over a `dim x dim` [`BitMatrix`] of modules. From there
//! the steps are: pick an orientation whose finder corners look right, read
//! format (and version) information, unmask, walk the zig-zag bitstream,
//! de-interleave and Reed-Solomon correct each block, then parse segments.

/// Data module positions and codeword packing
pub mod bitstream;
/// Format and version information (BCH protected)
pub mod format;
/// Function module mask (finders, timing, alignment, format/version areas)
pub mod function_mask;
/// Segment decoders (numeric, alphanumeric, byte, kanji)
pub mod modes;
mod orientation;
/// Block de-interleaving, correction and segment parsing
pub mod payload;
/// Error correction block tables
pub mod tables;
/// Data mask removal
pub mod unmask;

use tracing::trace;

use self::bitstream::{BitstreamExtractor, bits_to_codewords};
use self::format::{FormatInfo, VersionInfo};
use self::function_mask::FunctionMask;
use self::payload::{decode_payload, deinterleave_and_correct};
use self::unmask::unmask;
use crate::models::{Barcode, BitMatrix, ECLevel, MaskPattern, Symbology};

/// Finder sample mismatches tolerated when choosing an orientation.
const ORIENTATION_TOLERANCE: usize = 4;
const ORIENTATION_TOLERANCE_TRY_HARDER: usize = 7;
/// Timing rows must alternate this well before format brute force is tried.
const BRUTE_FORCE_MIN_TIMING: f32 = 0.6;

/// Version implied by a grid side length, if the side is a valid QR size.
pub fn version_for_dimension(dimension: usize) -> Option<u8> {
    if dimension < 21 || (dimension - 17) % 4 != 0 {
        return None;
    }
    let version = (dimension - 17) / 4;
    (1..=40).contains(&version).then_some(version as u8)
}

/// QR decoder over sampled module grids.
pub struct QrDecoder;

impl QrDecoder {
    /// Decode a sampled grid. `try_harder` relaxes the orientation check and,
    /// when format information is unreadable, tries every level and mask.
    pub fn decode(grid: &BitMatrix, try_harder: bool) -> Option<Barcode> {
        let dimension = grid.width();
        if grid.height() != dimension {
            return None;
        }
        let version = version_for_dimension(dimension)?;

        let tolerance = if try_harder {
            ORIENTATION_TOLERANCE_TRY_HARDER
        } else {
            ORIENTATION_TOLERANCE
        };
        let orientations = orientation::candidate_orientations(grid, tolerance);
        if orientations.is_empty() {
            trace!(dimension, "no orientation with plausible finders");
            return None;
        }

        for oriented in &orientations {
            if !Self::version_info_agrees(oriented, version) {
                continue;
            }
            let Some(format) = FormatInfo::read(oriented) else {
                continue;
            };
            if let Some(barcode) = Self::decode_with_format(oriented, version, &format) {
                return Some(barcode);
            }
        }

        if !try_harder {
            return None;
        }

        for oriented in &orientations {
            if orientation::timing_alternation(oriented) < BRUTE_FORCE_MIN_TIMING
                || !Self::version_info_agrees(oriented, version)
            {
                continue;
            }
            for ec_level in [ECLevel::L, ECLevel::M, ECLevel::Q, ECLevel::H] {
                for mask in MaskPattern::ALL {
                    let format = FormatInfo::new(ec_level, mask);
                    if let Some(barcode) = Self::decode_with_format(oriented, version, &format) {
                        trace!(?ec_level, ?mask, "decoded by format brute force");
                        return Some(barcode);
                    }
                }
            }
        }

        None
    }

    /// Decode an upright grid with known format information.
    pub fn decode_with_format(
        grid: &BitMatrix,
        version: u8,
        format: &FormatInfo,
    ) -> Option<Barcode> {
        let func = FunctionMask::new(version);
        if func.size() != grid.width() {
            return None;
        }

        let mut unmasked = grid.clone();
        unmask(&mut unmasked, &format.mask_pattern, &func);
        let bits = BitstreamExtractor::extract(&unmasked, &func);
        let codewords = bits_to_codewords(&bits);

        let corrected = deinterleave_and_correct(&codewords, version, format.ec_level)?;
        let (raw_bytes, text) = decode_payload(&corrected.data, version)?;
        if text.is_empty() {
            return None;
        }
        trace!(
            version,
            ec_level = ?format.ec_level,
            corrected = corrected.corrected,
            "qr payload decoded"
        );

        let confidence = if corrected.capacity == 0 {
            1.0
        } else {
            1.0 - 0.5 * corrected.corrected as f32 / corrected.capacity as f32
        };
        Some(Barcode {
            text,
            symbology: Symbology::QrCode,
            raw_bytes,
            confidence: confidence.clamp(0.0, 1.0),
        })
    }

    fn version_info_agrees(grid: &BitMatrix, version: u8) -> bool {
        if version < 7 {
            return true;
        }
        VersionInfo::read(grid).is_none_or(|read| read == version)
    }
}
