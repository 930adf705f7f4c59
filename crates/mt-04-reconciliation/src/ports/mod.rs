//! # Ports Layer
//!
//! - `inbound`: the reconciliation API driven by the bus consumer.
//! - `outbound`: the request store the engine persists through.

pub mod inbound;
pub mod outbound;
