//! # Reconciliation Errors

use std::time::Duration;
use thiserror::Error;

/// Errors from one reconciliation step.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconcileError {
    /// No request with this correlation id is visible yet.
    #[error("Request not found: {0}")]
    NotFound(String),

    /// The store rejected the write; nothing was persisted.
    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    /// The step did not finish before its deadline.
    #[error("Reconciliation timed out after {0:?}")]
    Timeout(Duration),

    /// The notification envelope could not be interpreted.
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),
}

impl ReconcileError {
    /// Whether retrying the same notification later can succeed.
    ///
    /// A missing request usually means the local write has not landed yet.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
