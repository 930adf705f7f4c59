//! # Shared Types Crate
//!
//! Primitive ledger types, the CloudEvents-style envelope and the payloads
//! exchanged with the external relayer.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses the bus lives here.
//! - **Hex on the wire**: addresses, hashes and byte blobs travel as
//!   `0x`-prefixed lowercase hex strings and are parsed at the edge.
//! - **Correlation by id**: the envelope `subject` carries the correlation id
//!   in both directions.

pub mod encoding;
pub mod entities;
pub mod envelope;
pub mod errors;
pub mod ipc;

pub use encoding::*;
pub use entities::*;
pub use envelope::EventEnvelope;
pub use errors::*;
pub use ipc::*;
