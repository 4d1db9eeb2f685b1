/// Decoded symbols and engine outcomes
pub mod barcode;
/// Located regions handed to the samplers
pub mod candidate;
/// 8-bit intensity grid
pub mod luminance;
/// Packed 1-bit matrix
pub mod matrix;
/// 2D points
pub mod point;
/// QR error correction levels and masks
pub mod qr_code;
/// Symbologies and allow-lists
pub mod symbology;

pub use barcode::{Barcode, DecodeResult};
pub use candidate::{Candidate, CandidateGeometry};
pub use luminance::LuminanceGrid;
pub use matrix::BitMatrix;
pub use point::Point;
pub use qr_code::{ECLevel, MaskPattern};
pub use symbology::{ParseSymbologyError, Symbology, SymbologySet};
