//! rust_barcode - 1D and 2D barcode reading in pure Rust
//!
//! The engine takes a luminance grid through binarization, pattern location,
//! module sampling and symbology decoding, and reports the first symbol that
//! decodes. [`BarcodeReader`] wraps it for callers holding images, encoded
//! bytes or base64 text.
//!
//! ```no_run
//! use rust_barcode::{BarcodeReader, DecodeOptions, Symbology, SymbologySet};
//!
//! let bytes = std::fs::read("label.png").unwrap();
//! let reader = BarcodeReader::with_options(
//!     DecodeOptions::default().with_formats(SymbologySet::only(Symbology::Code128)),
//! );
//! let result = reader.decode_bytes(&bytes);
//! println!("{:?}: {}", result.status(), result.message());
//! ```
//!
//! Supported symbologies: QR Code, Code 128, Code 39, EAN-13, EAN-8, UPC-A
//! and ITF. Decoding is read-only; [`synth`] draws clean symbols for tests
//! and benchmarks.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

mod config;

/// Symbology decoders (QR, linear) and Reed-Solomon
pub mod decoder;
/// Pattern location: QR finders and linear start guards
pub mod detector;
/// Error type and result alias
pub mod error;
/// Core data structures (grids, candidates, results, symbologies)
pub mod models;
/// Decode passes over one luminance grid
pub mod pipeline;
/// Caller-facing reader with observers and async calls
pub mod reader;
/// Module grid and run-length sampling
pub mod sampler;
/// Image and pixel buffer adapters
pub mod source;
/// Clean symbol synthesis
pub mod synth;
/// Binarization and geometry helpers
pub mod utils;

pub use error::{DecodeError, Result};
pub use models::{Barcode, DecodeResult, LuminanceGrid, Symbology, SymbologySet};
pub use pipeline::{DecodeOptions, decode};
pub use reader::{BarcodeReader, BarcodeResult, DecodeHandle, NOT_FOUND_MESSAGE, ObserverId, Status};
pub use source::PixelLayout;
