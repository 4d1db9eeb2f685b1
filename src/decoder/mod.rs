//! Symbology decoders
//!
//! Each decoder turns sampled modules into a [`Barcode`] or rejects them:
//! - QR: format/version BCH, unmasking, Reed-Solomon, segment parsing
//! - Linear: Code 128, Code 39, EAN-13/UPC-A/EAN-8 and ITF over run lengths
//!
//! Rejections are `None`; nothing here returns an error.

/// Linear symbologies over run lengths
pub mod oned;
/// QR code decoding from a sampled module grid
pub mod qr;
/// Reed-Solomon error correction
pub mod reed_solomon;

use tracing::trace;

use crate::models::{Barcode, Candidate, SymbologySet};
use crate::sampler::Sampled;

/// Decode what was sampled for `candidate`, reporting only symbologies in
/// `formats`.
pub fn decode_sampled(
    candidate: &Candidate,
    sampled: &Sampled,
    formats: SymbologySet,
    try_harder: bool,
) -> Option<Barcode> {
    let decoded = match sampled {
        Sampled::Grids(grids) => {
            if !formats.contains(candidate.symbology) {
                return None;
            }
            grids.iter().find_map(|grid| qr::QrDecoder::decode(grid, try_harder))
        }
        Sampled::Runs(runs) => {
            oned::reader_for(candidate.symbology).and_then(|reader| reader.decode(runs, formats))
        }
    };
    if decoded.is_none() {
        trace!(
            symbology = %candidate.symbology,
            x = candidate.anchor().x,
            y = candidate.anchor().y,
            "candidate rejected by decoder"
        );
    }
    decoded
}
