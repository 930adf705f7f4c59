//! # Event Bus Adapter
//!
//! Feeds `transaction.status` envelopes from the bus into the engine.
//!
//! ```text
//! Relayer ──transaction.status──→ [Bus] ──→ StatusConsumer ──┬─ id A: step, step, ...
//!                                                            ├─ id B: NotFound, back off, retry
//!                                                            └─ id C: step
//! ```
//!
//! Each correlation id gets its own queue and at most one task in flight,
//! so notifications for one id are applied in delivery order while a
//! request stuck in `NotFound` retries never holds up the others.

use crate::domain::entities::{ReconciliationReport, StatusNotification};
use crate::domain::errors::ReconcileError;
use crate::ports::inbound::ReconciliationApi;
use shared_bus::{BusMessage, MessageBus, Subscription, SubscriptionError, TopicFilter};
use shared_types::{EventEnvelope, TransactionStatusData, DEFAULT_STATUS_TOPIC, TRANSACTION_STATUS_EVENT};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{self, JoinSet};
use tracing::{debug, error, info, warn};

/// Bounded exponential backoff for retryable failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(200),
            max_backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (0-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 2u32.saturating_pow(retry);
        self.initial_backoff.saturating_mul(factor).min(self.max_backoff)
    }
}

/// Consumer settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumerConfig {
    /// Inbound topic.
    pub topic: String,
    /// Deadline for one reconciliation attempt.
    pub deadline: Duration,
    pub retry: RetryPolicy,
}

impl Default for ConsumerConfig {
    fn default() -> Self {
        Self {
            topic: DEFAULT_STATUS_TOPIC.to_string(),
            deadline: Duration::from_secs(10),
            retry: RetryPolicy::default(),
        }
    }
}

/// Counters for a running consumer.
#[derive(Debug, Default)]
pub struct ConsumerStats {
    received: AtomicU64,
    reconciled: AtomicU64,
    failed: AtomicU64,
    lagged: AtomicU64,
}

impl ConsumerStats {
    /// Messages taken off the bus.
    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Relaxed)
    }

    /// Notifications applied without error.
    pub fn reconciled(&self) -> u64 {
        self.reconciled.load(Ordering::Relaxed)
    }

    /// Notifications dropped as malformed or after a final error.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Messages overwritten on the bus before the consumer read them.
    pub fn lagged(&self) -> u64 {
        self.lagged.load(Ordering::Relaxed)
    }
}

/// Subscribes to status notifications and reconciles them.
///
/// The subscription is taken in [`StatusConsumer::new`], so anything
/// published after construction is buffered until [`StatusConsumer::run`]
/// picks it up.
pub struct StatusConsumer<E: ReconciliationApi> {
    reconciler: Arc<Reconciler<E>>,
    subscription: Subscription,
}

struct Reconciler<E> {
    engine: Arc<E>,
    config: ConsumerConfig,
    stats: Arc<ConsumerStats>,
}

impl<E: ReconciliationApi + 'static> StatusConsumer<E> {
    pub fn new<B: MessageBus + ?Sized>(bus: &B, engine: Arc<E>, config: ConsumerConfig) -> Self {
        let subscription = bus.subscribe(TopicFilter::topic(config.topic.clone()));
        Self {
            reconciler: Arc::new(Reconciler {
                engine,
                config,
                stats: Arc::new(ConsumerStats::default()),
            }),
            subscription,
        }
    }

    /// Report into `stats` instead of a private set of counters.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<ConsumerStats>) -> Self {
        if let Some(reconciler) = Arc::get_mut(&mut self.reconciler) {
            reconciler.stats = stats;
        }
        self
    }

    pub fn stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.reconciler.stats)
    }

    /// Consume until `shutdown` flips to `true` or the bus closes.
    ///
    /// Work still in flight at shutdown is cancelled; a cancelled step
    /// persists nothing.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let Self {
            reconciler,
            mut subscription,
        } = self;
        let topic = reconciler.config.topic.clone();
        info!(%topic, "Status consumer started");

        // ids with a task in flight, and what arrived for them meanwhile
        let mut queued: HashMap<String, VecDeque<StatusNotification>> = HashMap::new();
        let mut running: HashMap<task::Id, String> = HashMap::new();
        let mut in_flight: JoinSet<()> = JoinSet::new();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                Some(joined) = in_flight.join_next_with_id() => {
                    let task_id = match joined {
                        Ok((task_id, ())) => task_id,
                        Err(e) => {
                            error!(error = %e, "Reconciliation task failed");
                            e.id()
                        }
                    };
                    let Some(id) = running.remove(&task_id) else {
                        continue;
                    };
                    match queued.get_mut(&id).and_then(VecDeque::pop_front) {
                        Some(next) => spawn_step(&mut in_flight, &mut running, &reconciler, next),
                        None => {
                            queued.remove(&id);
                        }
                    }
                }
                received = subscription.recv() => match received {
                    Ok(message) => {
                        reconciler.stats.received.fetch_add(1, Ordering::Relaxed);
                        let notification = match parse(&message) {
                            Ok(n) => n,
                            Err(e) => {
                                reconciler.stats.failed.fetch_add(1, Ordering::Relaxed);
                                warn!(key = %message.key, error = %e, "Dropping malformed notification");
                                continue;
                            }
                        };
                        match queued.get_mut(&notification.correlation_id) {
                            Some(waiting) => waiting.push_back(notification),
                            None => {
                                queued.insert(notification.correlation_id.clone(), VecDeque::new());
                                spawn_step(&mut in_flight, &mut running, &reconciler, notification);
                            }
                        }
                    }
                    Err(SubscriptionError::Lagged { missed }) => {
                        reconciler.stats.lagged.fetch_add(missed, Ordering::Relaxed);
                    }
                    Err(SubscriptionError::Closed) => {
                        warn!("Message bus closed");
                        break;
                    }
                },
            }
        }

        let cancelled = in_flight.len();
        in_flight.shutdown().await;
        info!(
            %topic,
            cancelled,
            lagged = reconciler.stats.lagged(),
            "Status consumer stopped"
        );
    }

    /// Parse and reconcile one bus message.
    pub async fn handle_message(&self, message: &BusMessage) -> Result<ReconciliationReport, ReconcileError> {
        let notification = match parse(message) {
            Ok(n) => n,
            Err(e) => {
                warn!(key = %message.key, error = %e, "Dropping malformed notification");
                return Err(e);
            }
        };
        self.reconciler.reconcile_with_retry(&notification).await
    }

    /// Reconcile, retrying `NotFound` with bounded backoff.
    pub async fn reconcile_with_retry(
        &self,
        notification: &StatusNotification,
    ) -> Result<ReconciliationReport, ReconcileError> {
        self.reconciler.reconcile_with_retry(notification).await
    }
}

fn spawn_step<E: ReconciliationApi + 'static>(
    in_flight: &mut JoinSet<()>,
    running: &mut HashMap<task::Id, String>,
    reconciler: &Arc<Reconciler<E>>,
    notification: StatusNotification,
) {
    let id = notification.correlation_id.clone();
    let reconciler = Arc::clone(reconciler);
    let handle = in_flight.spawn(async move {
        let counter = match reconciler.reconcile_with_retry(&notification).await {
            Ok(_) => &reconciler.stats.reconciled,
            Err(_) => &reconciler.stats.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    });
    running.insert(handle.id(), id);
}

impl<E: ReconciliationApi> Reconciler<E> {
    async fn reconcile_with_retry(
        &self,
        notification: &StatusNotification,
    ) -> Result<ReconciliationReport, ReconcileError> {
        let policy = self.config.retry;
        let mut attempt = 1;
        loop {
            match self
                .engine
                .on_status_notification_with_deadline(notification, self.config.deadline)
                .await
            {
                Ok(report) => return Ok(report),
                Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                    let delay = policy.backoff(attempt - 1);
                    debug!(
                        correlation_id = %notification.correlation_id,
                        attempt,
                        ?delay,
                        error = %e,
                        "Retrying notification"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => {
                    error!(
                        correlation_id = %notification.correlation_id,
                        status = ?notification.status,
                        attempt,
                        error = %e,
                        "Reconciliation failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}

fn parse(message: &BusMessage) -> Result<StatusNotification, ReconcileError> {
    let envelope: EventEnvelope<TransactionStatusData> = EventEnvelope::from_bytes(&message.payload)
        .map_err(|e| ReconcileError::MalformedNotification(e.to_string()))?;
    if envelope.event_type != TRANSACTION_STATUS_EVENT {
        return Err(ReconcileError::MalformedNotification(format!(
            "unexpected event type {}",
            envelope.event_type
        )));
    }
    StatusNotification::from_envelope(envelope)
}
