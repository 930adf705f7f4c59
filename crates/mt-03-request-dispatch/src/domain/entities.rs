//! # Domain Entities

use mt_01_abi_codec::AbiValue;
use mt_02_typed_signing::{RecoverableSignature, TypedMessage};
use shared_types::{Address, DEFAULT_REQUEST_TOPIC};
use std::time::Duration;

/// Envelope `source` used when none is configured.
pub const DEFAULT_SOURCE: &str = "mtx/dispatcher";

/// Dispatcher settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Envelope `source` attribute.
    pub source: String,
    /// Outbound topic.
    pub topic: String,
    /// Deadline for one publish.
    pub deadline: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            source: DEFAULT_SOURCE.to_string(),
            topic: DEFAULT_REQUEST_TOPIC.to_string(),
            deadline: Duration::from_secs(5),
        }
    }
}

/// A registry call together with the typed message and signature that
/// authorize it.
#[derive(Debug, Clone)]
pub struct AuthorizedAction {
    pub correlation_id: String,
    /// Target contract.
    pub contract: Address,
    /// Function name in the registry interface.
    pub function: String,
    /// Call arguments in declaration order.
    pub args: Vec<AbiValue>,
    /// The message the signer approved.
    pub message: TypedMessage,
    pub signature: RecoverableSignature,
    /// Address that must have produced `signature`.
    pub expected_signer: Address,
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchReceipt {
    pub correlation_id: String,
    /// Id of the published envelope.
    pub envelope_id: String,
    pub calldata: Vec<u8>,
    /// Subscribers that received the envelope.
    pub receivers: usize,
}
