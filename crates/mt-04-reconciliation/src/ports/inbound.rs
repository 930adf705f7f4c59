//! # Inbound Ports (Driving Ports / API)

use crate::domain::entities::{ReconciliationReport, StatusNotification};
use crate::domain::errors::ReconcileError;
use async_trait::async_trait;
use std::time::Duration;

/// Inbound half of the meta-transaction flow.
#[async_trait]
pub trait ReconciliationApi: Send + Sync {
    /// Apply one status notification to its request.
    ///
    /// Notifications for the same correlation id are serialized; different
    /// ids may run concurrently.
    async fn on_status_notification(
        &self,
        notification: &StatusNotification,
    ) -> Result<ReconciliationReport, ReconcileError>;

    /// [`Self::on_status_notification`] bounded by `deadline`. A step cut
    /// short by the deadline persists nothing.
    async fn on_status_notification_with_deadline(
        &self,
        notification: &StatusNotification,
        deadline: Duration,
    ) -> Result<ReconciliationReport, ReconcileError> {
        tokio::time::timeout(deadline, self.on_status_notification(notification))
            .await
            .map_err(|_| ReconcileError::Timeout(deadline))?
    }
}
