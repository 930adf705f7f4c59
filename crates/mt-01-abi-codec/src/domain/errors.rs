//! # Codec Errors
//!
//! Error types for encoding and decoding.

use thiserror::Error;

/// Errors that can occur while encoding or decoding ABI data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AbiError {
    /// A type string could not be parsed.
    #[error("Invalid ABI type: {0}")]
    InvalidType(String),

    /// A value does not match the declared type.
    #[error("Type mismatch: expected {expected}, got {found}")]
    TypeMismatch { expected: String, found: &'static str },

    /// Number of values differs from the number of declared types.
    #[error("Arity mismatch: expected {expected} values, got {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A value does not fit its declared width.
    #[error("Value out of range for {0}")]
    ValueOutOfRange(String),

    /// Input ended before the value was complete.
    #[error("Insufficient data: needed {needed} bytes, have {available}")]
    InsufficientData { needed: usize, available: usize },

    /// Input continues after the last decoded value.
    #[error("Residual data: consumed {consumed} of {total} bytes")]
    ResidualData { consumed: usize, total: usize },

    /// An offset or length word points outside the input.
    #[error("Invalid offset or length word: {0}")]
    InvalidOffset(String),

    /// Non-canonical padding bytes.
    #[error("Invalid padding for {0}")]
    InvalidPadding(String),

    /// String payload is not UTF-8.
    #[error("Invalid UTF-8 in string value")]
    InvalidUtf8,

    /// Indexed argument that does not fit in a single topic word.
    #[error("Argument {name} of type {ty} cannot be indexed")]
    UnsupportedIndexedType { name: String, ty: String },

    /// A log does not match its event descriptor.
    #[error("Malformed log for {event}: {reason}")]
    MalformedLog { event: String, reason: String },

    /// Calldata does not start with the expected selector.
    #[error("Selector mismatch for {function}")]
    SelectorMismatch { function: String },

    /// Function not present in the contract interface.
    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    /// Event not present in the contract interface.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// The JSON interface definition could not be loaded.
    #[error("Invalid contract interface: {0}")]
    InvalidInterface(String),
}

impl AbiError {
    /// Wrap a data-level decode failure as a malformed log of `event`.
    pub(crate) fn into_malformed_log(self, event: &str) -> Self {
        match self {
            Self::MalformedLog { .. } => self,
            other => Self::MalformedLog {
                event: event.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
