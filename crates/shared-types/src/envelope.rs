//! # `EventEnvelope` Wrapper
//!
//! CloudEvents-style envelope wrapping every payload on the message bus.
//!
//! ## Properties
//!
//! - **Versioning**: `specversion` is fixed at [`SPEC_VERSION`].
//! - **Correlation**: `subject` carries the correlation id; the bus key for
//!   the envelope is the same id.
//! - **Identity**: `id` is unique per envelope (not per request), so two
//!   deliveries of one status update may carry different ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// CloudEvents spec version emitted on every envelope.
pub const SPEC_VERSION: &str = "1.0";

/// The universal message envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope<T> {
    /// Unique envelope id.
    pub id: String,
    /// Producer identifier (e.g. `mtx/dispatcher`).
    pub source: String,
    /// Envelope format version.
    #[serde(rename = "specversion")]
    pub spec_version: String,
    /// Correlation id of the meta-transaction request.
    pub subject: String,
    /// Creation time.
    pub time: DateTime<Utc>,
    /// Event type, e.g. `transaction.request`.
    #[serde(rename = "type")]
    pub event_type: String,
    /// Payload.
    pub data: T,
}

impl<T> EventEnvelope<T> {
    /// Wrap `data` in a fresh envelope stamped with the current time.
    pub fn new(
        source: impl Into<String>,
        event_type: impl Into<String>,
        subject: impl Into<String>,
        data: T,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.into(),
            spec_version: SPEC_VERSION.to_string(),
            subject: subject.into(),
            time: Utc::now(),
            event_type: event_type.into(),
            data,
        }
    }
}

impl<T: Serialize> EventEnvelope<T> {
    /// Serialize to the JSON bytes carried on the bus.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

impl<T: for<'de> Deserialize<'de>> EventEnvelope<T> {
    /// Parse an envelope from bus bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}
