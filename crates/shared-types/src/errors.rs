//! # Error Types
//!
//! Errors raised while parsing wire values.

use thiserror::Error;

/// Errors from hex decoding of wire fields.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EncodingError {
    /// The string is not valid hex.
    #[error("Invalid hex in {field}: {reason}")]
    InvalidHex { field: &'static str, reason: String },

    /// Decoded value has the wrong byte length.
    #[error("Invalid length for {field}: expected {expected} bytes, got {actual}")]
    InvalidLength {
        field: &'static str,
        expected: usize,
        actual: usize,
    },
}
