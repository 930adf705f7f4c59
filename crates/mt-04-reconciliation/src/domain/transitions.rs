//! # Status Transitions
//!
//! Rules of the request lifecycle `Unstarted -> Submitted -> Mined ->
//! Confirmed`. Transitions are driven only by notifications.

use super::entities::Outcome;
use super::events::RegistryEvent;
use shared_types::TransactionStatus;

/// How an incoming status relates to the stored one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTransition {
    /// Incoming status is later in the lifecycle.
    Advance,
    /// Same status delivered again.
    Duplicate,
    /// Incoming status is earlier; never applied.
    Regression,
}

#[must_use]
pub fn classify(current: TransactionStatus, incoming: TransactionStatus) -> StatusTransition {
    match incoming.cmp(&current) {
        std::cmp::Ordering::Greater => StatusTransition::Advance,
        std::cmp::Ordering::Equal => StatusTransition::Duplicate,
        std::cmp::Ordering::Less => StatusTransition::Regression,
    }
}

/// Write `event` into `outcome` if it is the outcome's event and the
/// outcome is not yet applied. Returns whether anything changed.
pub fn apply_event(outcome: &mut Outcome, event: &RegistryEvent) -> bool {
    if outcome.is_applied() {
        return false;
    }
    match (outcome, event) {
        (Outcome::Mint { token_id, .. }, RegistryEvent::NodeMinted { node_id, .. }) => {
            *token_id = Some(*node_id);
            true
        }
        (Outcome::Claim { owner, .. }, RegistryEvent::DeviceClaimed { owner: claimed, .. }) => {
            *owner = Some(*claimed);
            true
        }
        (Outcome::Unpair { pairing_request, .. }, RegistryEvent::DeviceUnpaired { .. }) => {
            *pairing_request = None;
            true
        }
        _ => false,
    }
}
