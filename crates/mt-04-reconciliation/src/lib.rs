//! # Reconciliation (MT-04)
//!
//! Consumes relayer status notifications, advances the matching request's
//! lifecycle and, on confirmation, decodes the ledger logs and applies the
//! request's outcome exactly once.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): requests, outcomes, registry events and
//!   the status rules. Pure, no I/O.
//! - **Ports Layer** (`ports/`): `ReconciliationApi` (driving) and
//!   `RequestStore` (driven).
//! - **Adapters Layer** (`adapters/`): in-memory store and the bus consumer.
//! - **Service Layer** (`service.rs`): `ReconciliationEngine`.
//!
//! ## Invariants
//!
//! - Status never regresses.
//! - A confirmed status is never visible without its outcome write from
//!   the same step, and vice versa.
//! - Replaying a confirmation whose outcome is set changes nothing.
//! - A log that fails to decode is skipped; it never aborts the step.

pub mod adapters;
pub mod domain;
pub mod locks;
pub mod ports;
pub mod service;

// Re-export public API
pub use adapters::{ConsumerConfig, ConsumerStats, InMemoryRequestStore, RetryPolicy, StatusConsumer};
pub use domain::entities::{MetaTransactionRequest, Outcome, ReconciliationReport, StatusNotification};
pub use domain::errors::ReconcileError;
pub use domain::events::{EventRegistry, RegistryEvent, RegistryEventKind};
pub use domain::transitions::{apply_event, classify, StatusTransition};
pub use locks::KeyedLocks;
pub use ports::inbound::ReconciliationApi;
pub use ports::outbound::RequestStore;
pub use service::ReconciliationEngine;
