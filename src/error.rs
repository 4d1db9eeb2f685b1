//! Error types for the decode engine.
//!
//! Every failure that a caller can observe is a [`DecodeError`]. The reader
//! surface turns these into an `Error` status instead of returning them, so
//! most callers only meet this type through a result message.

use std::time::Duration;

use thiserror::Error;

/// Errors raised while loading, sampling or decoding an image.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The caller handed over something that is not a usable image.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// What was wrong with the input.
        message: String,
    },

    /// The encoded image bytes could not be decoded.
    #[error("unreadable image: {0}")]
    Image(#[from] image::ImageError),

    /// The base64 payload was malformed.
    #[error("invalid base64 image data: {0}")]
    Base64(#[from] base64::DecodeError),

    /// A candidate's transform was degenerate or left the bitmap.
    #[error("degenerate geometry: {message}")]
    Geometry {
        /// Which geometric check failed.
        message: String,
    },

    /// A non-blocking decode was abandoned after the caller's deadline.
    #[error("decode did not finish within {0:?}")]
    Timeout(Duration),

    /// The engine panicked; the payload message is attached.
    #[error("decoder failed unexpectedly: {0}")]
    Panic(String),
}

impl DecodeError {
    /// Creates an [`DecodeError::InvalidInput`] error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a [`DecodeError::Geometry`] error.
    pub fn geometry(message: impl Into<String>) -> Self {
        Self::Geometry {
            message: message.into(),
        }
    }

    /// True for the input-side errors (bad bytes, bad base64, bad buffer).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::Image(_) | Self::Base64(_)
        )
    }
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DecodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_context() {
        let err = DecodeError::invalid_input("pixel buffer is empty");
        assert_eq!(err.to_string(), "invalid input: pixel buffer is empty");
        assert!(err.is_input_error());

        let err = DecodeError::geometry("singular transform");
        assert_eq!(err.to_string(), "degenerate geometry: singular transform");
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_timeout_message() {
        let err = DecodeError::Timeout(Duration::from_millis(250));
        assert!(err.to_string().contains("250ms"));
    }
}
