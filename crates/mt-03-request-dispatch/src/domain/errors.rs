//! # Dispatch Errors

use mt_01_abi_codec::AbiError;
use mt_02_typed_signing::SigningError;
use shared_bus::BusError;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced synchronously to the caller of a dispatch.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The request itself is unusable (e.g. empty correlation id).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Calldata could not be built.
    #[error("Encoding failed: {0}")]
    Encoding(#[from] AbiError),

    /// The action's signature did not authorize it.
    #[error("Authorization failed: {0}")]
    Signing(#[from] SigningError),

    /// The envelope could not be serialized.
    #[error("Envelope serialization failed: {0}")]
    Envelope(#[from] serde_json::Error),

    /// The bus rejected the publish.
    #[error("Transport failure: {0}")]
    TransportFailure(#[from] BusError),

    /// The publish did not complete before the deadline.
    #[error("Dispatch timed out after {0:?}")]
    Timeout(Duration),
}
