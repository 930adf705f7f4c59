//! # Shared Bus - Keyed Message Bus
//!
//! Transport between the request dispatcher, the external relayer and the
//! reconciliation engine.
//!
//! ```text
//! ┌────────────┐  publish(topic, key)  ┌───────────┐  subscribe(topic)  ┌────────────┐
//! │ Dispatcher │ ────────────────────→ │    Bus    │ ─────────────────→ │  Relayer   │
//! └────────────┘                       │           │                    └────────────┘
//! ┌────────────┐  subscribe(topic)     │           │  publish(topic, key)     │
//! │ Reconciler │ ←──────────────────── │           │ ←────────────────────────┘
//! └────────────┘                       └───────────┘
//! ```
//!
//! ## Ordering
//!
//! Messages published with the same key are delivered to every subscriber in
//! publication order. The in-memory implementation keeps a single FIFO
//! channel, which is strictly stronger than per-key ordering.
//!
//! ## Lag
//!
//! Each subscriber buffers up to the channel capacity. Past that the oldest
//! messages are overwritten and the next `recv` returns
//! `SubscriptionError::Lagged` with the number lost.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod message;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use message::{BusError, BusMessage, TopicFilter};
pub use publisher::{InMemoryMessageBus, MessageBus};
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum messages to buffer per subscriber before lagging.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;

/// Maximum accepted payload size in bytes.
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 1024 * 1024;
