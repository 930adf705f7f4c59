//! # Adapters Layer
//!
//! - `memory_store`: in-memory `RequestStore`.
//! - `bus`: consumer feeding status notifications from the message bus.

pub mod bus;
pub mod memory_store;

pub use bus::{ConsumerConfig, ConsumerStats, RetryPolicy, StatusConsumer};
pub use memory_store::InMemoryRequestStore;
