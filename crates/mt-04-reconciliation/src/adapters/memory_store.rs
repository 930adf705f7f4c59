//! In-Memory Request Store
//!
//! Implements the `RequestStore` port over a map. Commits replace the whole
//! row under one write lock, so a reader never sees a status without its
//! outcome.

use crate::domain::entities::MetaTransactionRequest;
use crate::domain::errors::ReconcileError;
use crate::ports::outbound::RequestStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tracing::debug;

/// Request store for tests and single-process deployments.
#[derive(Default)]
pub struct InMemoryRequestStore {
    requests: RwLock<HashMap<String, MetaTransactionRequest>>,
    fail_commits: AtomicBool,
    commits: AtomicU64,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following commit fail with `PersistenceFailure`.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.commits.load(Ordering::SeqCst)
    }

    /// Snapshot of a stored request.
    pub fn get(&self, id: &str) -> Option<MetaTransactionRequest> {
        self.requests.read().get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.requests.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.read().is_empty()
    }
}

#[async_trait]
impl RequestStore for InMemoryRequestStore {
    async fn insert(&self, request: MetaTransactionRequest) -> Result<(), ReconcileError> {
        let mut requests = self.requests.write();
        if requests.contains_key(&request.id) {
            return Err(ReconcileError::PersistenceFailure(format!(
                "request {} already exists",
                request.id
            )));
        }
        debug!(correlation_id = %request.id, outcome = request.outcome.kind(), "Request stored");
        requests.insert(request.id.clone(), request);
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<MetaTransactionRequest, ReconcileError> {
        self.get(id).ok_or_else(|| ReconcileError::NotFound(id.to_string()))
    }

    async fn commit(&self, request: &MetaTransactionRequest) -> Result<(), ReconcileError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(ReconcileError::PersistenceFailure("commit rejected".into()));
        }
        let mut requests = self.requests.write();
        let slot = requests
            .get_mut(&request.id)
            .ok_or_else(|| ReconcileError::PersistenceFailure(format!("request {} vanished", request.id)))?;
        *slot = request.clone();
        self.commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
