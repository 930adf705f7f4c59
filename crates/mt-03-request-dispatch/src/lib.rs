//! # Request Dispatch (MT-03)
//!
//! Turns an authorized registry action into calldata, wraps it in a
//! `transaction.request` envelope and publishes it keyed by correlation id.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): request/receipt entities, configuration
//!   and errors.
//! - **Ports Layer** (`ports/`): the `RequestDispatchApi` driving port.
//! - **Service Layer** (`service.rs`): `RequestDispatcher` over any
//!   `MessageBus`.
//!
//! ## Guarantees
//!
//! - An action whose signature does not verify is never published.
//! - Publish failures are returned as-is. Retrying belongs to the transport
//!   or to the caller, which may reuse the correlation id safely.
//! - Persisting the request row is the caller's job.

pub mod domain;
pub mod ports;
pub mod service;

// Re-export public API
pub use domain::entities::{AuthorizedAction, DispatchReceipt, DispatcherConfig, DEFAULT_SOURCE};
pub use domain::errors::DispatchError;
pub use ports::inbound::RequestDispatchApi;
pub use service::RequestDispatcher;
