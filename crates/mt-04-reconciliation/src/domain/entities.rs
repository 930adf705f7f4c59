//! # Domain Entities
//!
//! The meta-transaction request, its outcome variant, inbound notifications
//! and the per-notification report.

use super::errors::ReconcileError;
use super::events::RegistryEventKind;
use serde::{Deserialize, Serialize};
use shared_types::{parse_hash, Address, EventEnvelope, Hash, RawLog, TransactionStatus, TransactionStatusData, U256};
use tracing::warn;

// =============================================================================
// Requests
// =============================================================================

/// The one side effect a request applies once its transaction confirms.
///
/// Exactly one variant exists per request; the enum makes that structural.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Outcome {
    /// Mint of a device NFT; `token_id` is written once from `NodeMinted`.
    Mint {
        device_id: String,
        token_id: Option<U256>,
    },
    /// Claim of a hardware unit; `owner` is written once from
    /// `AftermarketDeviceClaimed`.
    Claim {
        unit_id: String,
        owner: Option<Address>,
    },
    /// Release of a pairing; `pairing_request` is cleared by
    /// `AftermarketDeviceUnpaired`.
    Unpair {
        integration_id: String,
        pairing_request: Option<String>,
    },
}

impl Outcome {
    pub fn mint(device_id: impl Into<String>) -> Self {
        Self::Mint {
            device_id: device_id.into(),
            token_id: None,
        }
    }

    pub fn claim(unit_id: impl Into<String>) -> Self {
        Self::Claim {
            unit_id: unit_id.into(),
            owner: None,
        }
    }

    pub fn unpair(integration_id: impl Into<String>, pairing_request: impl Into<String>) -> Self {
        Self::Unpair {
            integration_id: integration_id.into(),
            pairing_request: Some(pairing_request.into()),
        }
    }

    /// Whether the side effect has already been written.
    #[must_use]
    pub fn is_applied(&self) -> bool {
        match self {
            Self::Mint { token_id, .. } => token_id.is_some(),
            Self::Claim { owner, .. } => owner.is_some(),
            Self::Unpair { pairing_request, .. } => pairing_request.is_none(),
        }
    }

    /// The registry event that carries this outcome's fact.
    #[must_use]
    pub fn expected_event(&self) -> RegistryEventKind {
        match self {
            Self::Mint { .. } => RegistryEventKind::NodeMinted,
            Self::Claim { .. } => RegistryEventKind::DeviceClaimed,
            Self::Unpair { .. } => RegistryEventKind::DeviceUnpaired,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Mint { .. } => "mint",
            Self::Claim { .. } => "claim",
            Self::Unpair { .. } => "unpair",
        }
    }
}

/// The durable record of one attempted ledger mutation. Never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaTransactionRequest {
    /// Caller-generated correlation id; also the bus key.
    pub id: String,
    pub status: TransactionStatus,
    /// Ledger transaction hash, once submitted.
    pub hash: Option<Hash>,
    pub outcome: Outcome,
}

impl MetaTransactionRequest {
    /// A freshly authorized request.
    pub fn new(id: impl Into<String>, outcome: Outcome) -> Self {
        Self {
            id: id.into(),
            status: TransactionStatus::Unstarted,
            hash: None,
            outcome,
        }
    }

    #[must_use]
    pub fn with_status(mut self, status: TransactionStatus) -> Self {
        self.status = status;
        self
    }
}

// =============================================================================
// Notifications
// =============================================================================

/// A parsed status notification from the relayer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusNotification {
    pub correlation_id: String,
    pub status: TransactionStatus,
    pub hash: Option<Hash>,
    pub logs: Vec<RawLog>,
    /// Logs dropped because their hex fields did not parse.
    pub rejected_logs: Vec<String>,
}

impl StatusNotification {
    pub fn new(correlation_id: impl Into<String>, status: TransactionStatus) -> Self {
        Self {
            correlation_id: correlation_id.into(),
            status,
            hash: None,
            logs: Vec::new(),
            rejected_logs: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_hash(mut self, hash: Hash) -> Self {
        self.hash = Some(hash);
        self
    }

    #[must_use]
    pub fn with_logs(mut self, logs: Vec<RawLog>) -> Self {
        self.logs = logs;
        self
    }

    /// Interpret a `transaction.status` envelope.
    ///
    /// The correlation id comes from the envelope subject, falling back to
    /// the payload's `requestId`. An unparsable transaction hash rejects the
    /// notification; an unparsable log only drops that log.
    pub fn from_envelope(envelope: EventEnvelope<TransactionStatusData>) -> Result<Self, ReconcileError> {
        let data = envelope.data;
        let correlation_id = if envelope.subject.is_empty() {
            data.request_id
        } else {
            if !data.request_id.is_empty() && data.request_id != envelope.subject {
                warn!(
                    subject = %envelope.subject,
                    request_id = %data.request_id,
                    "Envelope subject and payload request id differ; using subject"
                );
            }
            envelope.subject
        };
        if correlation_id.is_empty() {
            return Err(ReconcileError::MalformedNotification("missing correlation id".into()));
        }

        let mut notification = Self::new(correlation_id, data.status);
        if let Some(tx) = data.transaction {
            if !tx.hash.is_empty() {
                let hash = parse_hash("transaction.hash", &tx.hash)
                    .map_err(|e| ReconcileError::MalformedNotification(e.to_string()))?;
                notification.hash = Some(hash);
            }
            for (index, log) in tx.logs.iter().enumerate() {
                match log.to_raw() {
                    Ok(raw) => notification.logs.push(raw),
                    Err(e) => notification.rejected_logs.push(format!("log {index}: {e}")),
                }
            }
        }
        Ok(notification)
    }
}

/// What one notification did to its request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconciliationReport {
    pub correlation_id: String,
    /// Stored status after the step.
    pub status: TransactionStatus,
    /// The stored status moved forward.
    pub advanced: bool,
    /// The outcome side effect was written by this step.
    pub outcome_applied: bool,
    /// Per-log decode failures; they never abort the step.
    pub decode_errors: Vec<String>,
}

impl ReconciliationReport {
    pub(crate) fn new(correlation_id: &str, status: TransactionStatus) -> Self {
        Self {
            correlation_id: correlation_id.to_string(),
            status,
            advanced: false,
            outcome_applied: false,
            decode_errors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{LogData, TransactionInfo, TRANSACTION_STATUS_EVENT};

    fn envelope(subject: &str, data: TransactionStatusData) -> EventEnvelope<TransactionStatusData> {
        EventEnvelope::new("relayer", TRANSACTION_STATUS_EVENT, subject, data)
    }

    #[test]
    fn test_fresh_outcomes_are_unapplied() {
        assert!(!Outcome::mint("dev-1").is_applied());
        assert!(!Outcome::claim("unit-1").is_applied());
        assert!(!Outcome::unpair("int-1", "pair-1").is_applied());
    }

    #[test]
    fn test_expected_events() {
        assert_eq!(Outcome::mint("d").expected_event(), RegistryEventKind::NodeMinted);
        assert_eq!(Outcome::claim("u").expected_event(), RegistryEventKind::DeviceClaimed);
        assert_eq!(Outcome::unpair("i", "p").expected_event(), RegistryEventKind::DeviceUnpaired);
    }

    #[test]
    fn test_from_envelope() {
        let data = TransactionStatusData {
            request_id: "req-1".into(),
            status: TransactionStatus::Confirmed,
            transaction: Some(TransactionInfo {
                hash: format!("0x{}", "ab".repeat(32)),
                logs: vec![
                    LogData {
                        address: None,
                        topics: vec![format!("0x{}", "01".repeat(32))],
                        data: "0x".into(),
                    },
                    LogData {
                        address: None,
                        topics: vec!["0xzz".into()],
                        data: "0x".into(),
                    },
                ],
            }),
        };
        let n = StatusNotification::from_envelope(envelope("req-1", data)).unwrap();
        assert_eq!(n.correlation_id, "req-1");
        assert_eq!(n.status, TransactionStatus::Confirmed);
        assert_eq!(n.hash, Some([0xab; 32]));
        assert_eq!(n.logs.len(), 1);
        assert_eq!(n.rejected_logs.len(), 1);
    }

    #[test]
    fn test_subject_falls_back_to_request_id() {
        let data = TransactionStatusData {
            request_id: "req-2".into(),
            status: TransactionStatus::Submitted,
            transaction: None,
        };
        let n = StatusNotification::from_envelope(envelope("", data)).unwrap();
        assert_eq!(n.correlation_id, "req-2");
        assert!(n.hash.is_none());
    }

    #[test]
    fn test_bad_hash_is_malformed() {
        let data = TransactionStatusData {
            request_id: "req-3".into(),
            status: TransactionStatus::Mined,
            transaction: Some(TransactionInfo {
                hash: "0x1234".into(),
                logs: vec![],
            }),
        };
        assert!(matches!(
            StatusNotification::from_envelope(envelope("req-3", data)),
            Err(ReconcileError::MalformedNotification(_))
        ));
    }

    #[test]
    fn test_missing_correlation_id_is_malformed() {
        let data = TransactionStatusData {
            request_id: String::new(),
            status: TransactionStatus::Mined,
            transaction: None,
        };
        assert!(StatusNotification::from_envelope(envelope("", data)).is_err());
    }
}
