//! # Bus Messages
//!
//! Keyed messages and the topic filter used by subscribers.

use std::sync::Arc;
use thiserror::Error;

/// Transport-level errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The bus has been shut down.
    #[error("Message bus closed")]
    Closed,

    /// Payload exceeds the configured limit.
    #[error("Payload too large: {size} bytes (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Topic name is empty.
    #[error("Empty topic name")]
    EmptyTopic,
}

/// A message as seen by subscribers.
///
/// The payload is shared between subscribers rather than copied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusMessage {
    /// Topic the message was published on.
    pub topic: String,
    /// Partition key (the correlation id for meta-transactions).
    pub key: String,
    /// Opaque payload bytes.
    pub payload: Arc<[u8]>,
}

impl BusMessage {
    /// Create a message.
    #[must_use]
    pub fn new(topic: impl Into<String>, key: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            key: key.into(),
            payload: payload.into(),
        }
    }
}

/// Filter for subscribing to specific topics.
#[derive(Debug, Clone, Default)]
pub struct TopicFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<String>,
    /// Restrict to a single key.
    pub key: Option<String>,
}

impl TopicFilter {
    /// Create a filter that accepts every message.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for a single topic.
    #[must_use]
    pub fn topic(topic: impl Into<String>) -> Self {
        Self {
            topics: vec![topic.into()],
            key: None,
        }
    }

    /// Restrict the filter to messages carrying `key`.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Check if a message matches this filter.
    #[must_use]
    pub fn matches(&self, message: &BusMessage) -> bool {
        let topic_match = self.topics.is_empty() || self.topics.iter().any(|t| *t == message.topic);
        let key_match = self.key.as_deref().map_or(true, |k| k == message.key);
        topic_match && key_match
    }
}
