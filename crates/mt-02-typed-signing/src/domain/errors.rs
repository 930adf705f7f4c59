//! # Signing Errors
//!
//! Error types for digest construction and signer recovery.

use shared_types::Address;
use thiserror::Error;

/// Errors that can occur while building a digest or recovering a signer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// Wrong length, bad recovery id or out-of-range scalars.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// No public key could be recovered from the signature.
    #[error("Failed to recover public key")]
    RecoveryFailure,

    /// Recovered signer does not match the expected signer
    #[error("Signer mismatch: expected {expected:?}, got {actual:?}")]
    SignerMismatch { expected: Address, actual: Address },

    /// The typed message does not match its declared schema.
    #[error("Invalid typed data: {0}")]
    InvalidTypedData(String),
}

impl SigningError {
    pub(crate) fn invalid_signature(reason: impl Into<String>) -> Self {
        Self::InvalidSignature(reason.into())
    }

    pub(crate) fn typed_data(reason: impl Into<String>) -> Self {
        Self::InvalidTypedData(reason.into())
    }
}
