//! # Core Entities
//!
//! Ledger primitives and the meta-transaction lifecycle status.

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export U256 from primitive-types for use across all crates
pub use primitive_types::U256;

/// A 32-byte Keccak-256 hash (transaction hash, topic word, digest).
pub type Hash = [u8; 32];

/// A 20-byte Ethereum-style address.
pub type Address = [u8; 20];

/// The zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Lifecycle status of a meta-transaction request.
///
/// Variants are declared in lifecycle order so that `Ord` gives the
/// monotonic progression `Unstarted < Submitted < Mined < Confirmed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TransactionStatus {
    /// Persisted locally, not yet acknowledged by the relayer.
    Unstarted,
    /// Relayer submitted the transaction to the ledger.
    Submitted,
    /// Transaction included in a block.
    Mined,
    /// Transaction reached the confirmation depth. Terminal.
    Confirmed,
}

impl TransactionStatus {
    /// Whether this is the terminal status.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Wire name of the status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unstarted => "Unstarted",
            Self::Submitted => "Submitted",
            Self::Mined => "Mined",
            Self::Confirmed => "Confirmed",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A raw ledger event log: topic words plus the non-indexed data payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLog {
    /// Emitting contract, when known.
    pub address: Option<Address>,
    /// Topic words; `topics[0]` is the event signature hash.
    pub topics: Vec<Hash>,
    /// ABI-encoded non-indexed arguments.
    pub data: Vec<u8>,
}

impl RawLog {
    /// Creates a log without an emitter address.
    #[must_use]
    pub fn new(topics: Vec<Hash>, data: Vec<u8>) -> Self {
        Self {
            address: None,
            topics,
            data,
        }
    }

    /// The event signature topic, if any.
    #[must_use]
    pub fn signature_topic(&self) -> Option<&Hash> {
        self.topics.first()
    }
}
