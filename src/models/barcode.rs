use super::Symbology;
use crate::error::DecodeError;

/// A successfully decoded symbol.
#[derive(Debug, Clone, PartialEq)]
pub struct Barcode {
    /// Decoded text
    pub text: String,
    /// Symbology it was read as
    pub symbology: Symbology,
    /// Payload bytes (QR data codewords' byte segments, or the text's bytes)
    pub raw_bytes: Vec<u8>,
    /// Decode confidence (0.0 - 1.0)
    pub confidence: f32,
}

impl Barcode {
    /// Build a result whose raw bytes are the text itself.
    pub fn from_text(text: String, symbology: Symbology, confidence: f32) -> Self {
        let raw_bytes = text.as_bytes().to_vec();
        Self {
            text,
            symbology,
            raw_bytes,
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Terminal outcome of one engine run.
#[derive(Debug)]
pub enum DecodeResult {
    /// A symbol was read.
    Found(Barcode),
    /// No readable symbol under the current configuration.
    NotFound,
    /// The input or geometry was unusable.
    Error(DecodeError),
}

impl DecodeResult {
    /// True for [`DecodeResult::Found`].
    pub fn is_found(&self) -> bool {
        matches!(self, DecodeResult::Found(_))
    }

    /// The decoded symbol, if any.
    pub fn barcode(&self) -> Option<&Barcode> {
        match self {
            DecodeResult::Found(barcode) => Some(barcode),
            _ => None,
        }
    }

    /// The decoded text, if any.
    pub fn text(&self) -> Option<&str> {
        self.barcode().map(|b| b.text.as_str())
    }
}
