//! # Bus Payloads
//!
//! Payloads exchanged with the external signing/relaying service.
//!
//! ## Flow
//!
//! ```text
//! Dispatcher ──transaction.request──→ Relayer
//!                                        │
//! Reconciler ←──status notification──────┘
//! ```

use crate::encoding::{from_hex, parse_hash, to_hex};
use crate::entities::{RawLog, TransactionStatus};
use crate::errors::EncodingError;
use serde::{Deserialize, Serialize};

/// Event type of outbound transaction requests.
pub const TRANSACTION_REQUEST_EVENT: &str = "transaction.request";

/// Event type of inbound status notifications.
pub const TRANSACTION_STATUS_EVENT: &str = "transaction.status";

/// Default bus topic for outbound transaction requests.
pub const DEFAULT_REQUEST_TOPIC: &str = "topic.transaction.request";

/// Default bus topic for inbound status notifications.
pub const DEFAULT_STATUS_TOPIC: &str = "topic.transaction.status";

/// Outbound request: call `data` on contract `to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRequestData {
    /// Correlation id.
    pub id: String,
    /// Target contract, `0x` hex.
    pub to: String,
    /// ABI calldata, `0x` hex.
    pub data: String,
}

/// Inbound status notification payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionStatusData {
    /// Correlation id of the request this status belongs to.
    #[serde(rename = "requestId")]
    pub request_id: String,
    /// New status.
    #[serde(rename = "type")]
    pub status: TransactionStatus,
    /// Ledger details; absent before submission.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionInfo>,
}

/// Ledger transaction details carried by a status notification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInfo {
    /// Transaction hash, `0x` hex.
    pub hash: String,
    /// Emitted logs; only populated on terminal notifications.
    #[serde(default)]
    pub logs: Vec<LogData>,
}

/// Wire form of a ledger log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogData {
    /// Emitting contract, `0x` hex.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Topic words, `0x` hex.
    pub topics: Vec<String>,
    /// Data payload, `0x` hex.
    pub data: String,
}

impl LogData {
    /// Build the wire form of a decoded log.
    #[must_use]
    pub fn from_raw(log: &RawLog) -> Self {
        Self {
            address: log.address.map(|a| to_hex(&a)),
            topics: log.topics.iter().map(|t| to_hex(t)).collect(),
            data: to_hex(&log.data),
        }
    }

    /// Parse the hex fields into a [`RawLog`].
    pub fn to_raw(&self) -> Result<RawLog, EncodingError> {
        let address = match &self.address {
            Some(a) => Some(crate::encoding::parse_address("log.address", a)?),
            None => None,
        };
        let topics = self
            .topics
            .iter()
            .map(|t| parse_hash("log.topics", t))
            .collect::<Result<Vec<_>, _>>()?;
        let data = from_hex("log.data", &self.data)?;
        Ok(RawLog {
            address,
            topics,
            data,
        })
    }
}
