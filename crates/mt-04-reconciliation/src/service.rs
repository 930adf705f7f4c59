//! # Reconciliation Engine
//!
//! Applies status notifications to stored requests.
//!
//! ## Step
//!
//! 1. Serialize on the correlation id and load the request.
//! 2. Advance `status`/`hash`; regressions are ignored.
//! 3. On `Confirmed`, scan logs for the outcome's event and write it once.
//! 4. Commit status and outcome together, or nothing at all.

use crate::domain::entities::{ReconciliationReport, StatusNotification};
use crate::domain::errors::ReconcileError;
use crate::domain::events::EventRegistry;
use crate::domain::transitions::{apply_event, classify, StatusTransition};
use crate::locks::KeyedLocks;
use crate::ports::inbound::ReconciliationApi;
use crate::ports::outbound::RequestStore;
use async_trait::async_trait;
use shared_types::{to_hex, TransactionStatus};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Matches relayer notifications back to requests and applies their
/// outcome exactly once.
pub struct ReconciliationEngine<S: RequestStore> {
    store: Arc<S>,
    registry: Arc<EventRegistry>,
    locks: KeyedLocks,
}

impl<S: RequestStore> ReconciliationEngine<S> {
    pub fn new(store: Arc<S>, registry: Arc<EventRegistry>) -> Self {
        Self {
            store,
            registry,
            locks: KeyedLocks::new(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: RequestStore> ReconciliationApi for ReconciliationEngine<S> {
    async fn on_status_notification(
        &self,
        notification: &StatusNotification,
    ) -> Result<ReconciliationReport, ReconcileError> {
        let id = notification.correlation_id.as_str();
        let _guard = self.locks.lock(id).await;

        let mut request = match self.store.find_by_id(id).await {
            Ok(request) => request,
            Err(e) => {
                debug!(correlation_id = id, error = %e, "Request lookup failed");
                return Err(e);
            }
        };
        let mut report = ReconciliationReport::new(id, request.status);
        report.decode_errors.extend(notification.rejected_logs.iter().cloned());
        let mut dirty = false;

        match classify(request.status, notification.status) {
            StatusTransition::Regression => {
                debug!(
                    correlation_id = id,
                    stored = ?request.status,
                    incoming = ?notification.status,
                    "Ignoring status regression"
                );
                return Ok(report);
            }
            StatusTransition::Duplicate => {
                debug!(correlation_id = id, status = ?notification.status, "Duplicate status");
            }
            StatusTransition::Advance => {
                info!(
                    correlation_id = id,
                    from = ?request.status,
                    to = ?notification.status,
                    "Request status advanced"
                );
                request.status = notification.status;
                report.advanced = true;
                dirty = true;
            }
        }

        if let Some(hash) = notification.hash {
            if request.hash != Some(hash) {
                debug!(correlation_id = id, hash = %to_hex(&hash), "Recording transaction hash");
                request.hash = Some(hash);
                dirty = true;
            }
        }

        if notification.status == TransactionStatus::Confirmed {
            if request.outcome.is_applied() {
                debug!(correlation_id = id, outcome = request.outcome.kind(), "Outcome already applied");
            } else {
                let expected = request.outcome.expected_event();
                for (index, log) in notification.logs.iter().enumerate() {
                    let event = match self.registry.decode(log) {
                        None => continue,
                        Some(Ok(event)) => event,
                        Some(Err(e)) => {
                            warn!(correlation_id = id, log_index = index, error = %e, "Skipping undecodable log");
                            report.decode_errors.push(format!("log {index}: {e}"));
                            continue;
                        }
                    };
                    if event.kind() == expected && apply_event(&mut request.outcome, &event) {
                        info!(
                            correlation_id = id,
                            outcome = request.outcome.kind(),
                            log_index = index,
                            "Outcome applied"
                        );
                        report.outcome_applied = true;
                        dirty = true;
                        break;
                    }
                }
                if !report.outcome_applied {
                    debug!(correlation_id = id, expected = ?expected, "No matching log in confirmation");
                }
            }
        }

        if dirty {
            if let Err(e) = self.store.commit(&request).await {
                error!(correlation_id = id, error = %e, "Reconciliation commit failed; rolled back");
                return Err(e);
            }
        }

        report.status = request.status;
        Ok(report)
    }
}
