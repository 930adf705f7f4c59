//! # Message Publisher
//!
//! The `MessageBus` port and its in-memory implementation.

use crate::message::{BusError, BusMessage, TopicFilter};
use crate::subscriber::Subscription;
use crate::{DEFAULT_CHANNEL_CAPACITY, DEFAULT_MAX_PAYLOAD_BYTES};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Keyed publish/subscribe transport.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish `payload` on `topic`, partitioned by `key`.
    ///
    /// # Returns
    ///
    /// The number of active subscribers that received the message.
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<usize, BusError>;

    /// Subscribe to messages matching `filter`.
    fn subscribe(&self, filter: TopicFilter) -> Subscription;

    /// Total number of messages accepted for publication.
    fn messages_published(&self) -> u64;
}

/// Single-process bus over one `tokio::sync::broadcast` channel.
///
/// Request and status topics share the channel; subscribers filter by
/// topic. A broker-backed `MessageBus` replaces it across processes.
pub struct InMemoryMessageBus {
    sender: broadcast::Sender<BusMessage>,

    messages_published: AtomicU64,

    /// Set once the bus is shut down.
    closed: AtomicBool,

    /// Channel capacity.
    capacity: usize,

    /// Maximum payload size.
    max_payload_bytes: usize,
}

impl InMemoryMessageBus {
    /// Create a new in-memory bus with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a bus buffering `capacity` messages per subscriber.
    ///
    /// # Panics
    ///
    /// If `capacity` is zero.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            messages_published: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            capacity,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }

    /// Override the maximum payload size.
    #[must_use]
    pub fn with_max_payload_bytes(mut self, max_payload_bytes: usize) -> Self {
        self.max_payload_bytes = max_payload_bytes;
        self
    }

    /// Get the number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Reject every further publication.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Whether the bus has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Default for InMemoryMessageBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessageBus for InMemoryMessageBus {
    async fn publish(&self, topic: &str, key: &str, payload: Vec<u8>) -> Result<usize, BusError> {
        if self.is_closed() {
            return Err(BusError::Closed);
        }
        if topic.is_empty() {
            return Err(BusError::EmptyTopic);
        }
        if payload.len() > self.max_payload_bytes {
            return Err(BusError::PayloadTooLarge {
                size: payload.len(),
                max: self.max_payload_bytes,
            });
        }

        self.messages_published.fetch_add(1, Ordering::Relaxed);

        match self.sender.send(BusMessage::new(topic, key, payload)) {
            Ok(receiver_count) => {
                debug!(topic, key, receivers = receiver_count, "Message published");
                Ok(receiver_count)
            }
            Err(e) => {
                // No receivers - message is dropped
                warn!(topic, key, error = %e, "Message dropped (no receivers)");
                Ok(0)
            }
        }
    }

    fn subscribe(&self, filter: TopicFilter) -> Subscription {
        debug!(topics = ?filter.topics, key = ?filter.key, "New subscription created");
        Subscription::new(self.sender.subscribe(), filter)
    }

    fn messages_published(&self) -> u64 {
        self.messages_published.load(Ordering::Relaxed)
    }
}
