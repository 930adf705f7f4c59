//! # Subscriber
//!
//! A `Subscription` yields the messages of its filter in publication order.
//! A reader that falls more than the channel capacity behind loses the
//! oldest messages; `recv` reports how many instead of skipping silently.

use crate::message::{BusMessage, TopicFilter};
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, error};

/// Errors from [`Subscription::recv`].
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionError {
    /// The bus was dropped. No further messages will arrive.
    #[error("Message bus closed")]
    Closed,

    /// The subscriber fell behind and `missed` messages were overwritten.
    /// The subscription stays usable and resumes at the oldest retained
    /// message.
    #[error("Subscriber lagged, {missed} messages lost")]
    Lagged { missed: u64 },
}

/// Receiving end of one `subscribe` call.
pub struct Subscription {
    receiver: broadcast::Receiver<BusMessage>,
    filter: TopicFilter,
    missed: u64,
}

impl Subscription {
    pub(crate) fn new(receiver: broadcast::Receiver<BusMessage>, filter: TopicFilter) -> Self {
        Self {
            receiver,
            filter,
            missed: 0,
        }
    }

    /// Wait for the next message matching the filter.
    ///
    /// `Lagged` is returned once per overflow; call `recv` again to continue.
    pub async fn recv(&mut self) -> Result<BusMessage, SubscriptionError> {
        loop {
            match self.receiver.recv().await {
                Ok(message) if self.filter.matches(&message) => return Ok(message),
                Ok(message) => {
                    debug!(topic = %message.topic, key = %message.key, "Skipping unmatched message");
                }
                Err(RecvError::Closed) => return Err(SubscriptionError::Closed),
                Err(RecvError::Lagged(missed)) => {
                    self.missed = self.missed.saturating_add(missed);
                    error!(topics = ?self.filter.topics, missed, "Subscriber lagged, messages lost");
                    return Err(SubscriptionError::Lagged { missed });
                }
            }
        }
    }

    /// Messages lost to lag over the lifetime of this subscription.
    #[must_use]
    pub fn missed(&self) -> u64 {
        self.missed
    }
}
