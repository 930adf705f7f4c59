//! # Outbound Ports (Driven Ports / SPI)

use crate::domain::entities::MetaTransactionRequest;
use crate::domain::errors::ReconcileError;
use async_trait::async_trait;

/// Durable store of meta-transaction requests.
///
/// The store is the single source of truth for request state.
#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Persist a new request. Fails if the id already exists.
    async fn insert(&self, request: MetaTransactionRequest) -> Result<(), ReconcileError>;

    /// Load a request together with its outcome variant.
    ///
    /// # Errors
    /// `NotFound` when no request with `id` is visible.
    async fn find_by_id(&self, id: &str) -> Result<MetaTransactionRequest, ReconcileError>;

    /// Atomically replace the stored request (status, hash and outcome) in
    /// one transaction. On error nothing is written.
    async fn commit(&self, request: &MetaTransactionRequest) -> Result<(), ReconcileError>;
}
