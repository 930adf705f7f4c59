//! # Runtime Configuration
//!
//! Unified configuration for the bus, the signing domain, dispatch and
//! reconciliation.
//!
//! Every field has a default. `MTX_*` environment variables override them;
//! an override that does not parse is reported and the default is kept.
//!
//! ## Safety Requirements
//!
//! - `verifying_contract` MUST NOT be the zero address
//! - the reconciliation retry budget MUST allow at least one attempt

use mt_03_request_dispatch::{DispatcherConfig, DEFAULT_SOURCE};
use mt_04_reconciliation::{ConsumerConfig, RetryPolicy};
use shared_types::{parse_address, Address, DEFAULT_REQUEST_TOPIC, DEFAULT_STATUS_TOPIC};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct RuntimeConfig {
    pub bus: BusConfig,
    pub signing: SigningDomainConfig,
    pub reconcile: ReconcileConfig,
    pub log: LogConfig,
}

/// Configuration errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The signing domain has no verifying contract.
    #[error("verifying contract is the zero address; set MTX_VERIFYING_CONTRACT")]
    ZeroVerifyingContract,

    /// Retries are configured away entirely.
    #[error("reconciliation retry budget must be at least one attempt")]
    ZeroRetryBudget,

    /// The bus cannot buffer anything.
    #[error("bus capacity must be at least one message; check MTX_BUS_CAPACITY")]
    ZeroBusCapacity,
}

/// An environment override that was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IgnoredOverride {
    pub key: &'static str,
    pub value: String,
}

impl RuntimeConfig {
    /// Check the configuration before anything is wired.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.signing.verifying_contract == [0u8; 20] {
            return Err(ConfigError::ZeroVerifyingContract);
        }
        if self.reconcile.max_attempts == 0 {
            return Err(ConfigError::ZeroRetryBudget);
        }
        if self.bus.capacity == 0 {
            return Err(ConfigError::ZeroBusCapacity);
        }
        Ok(())
    }

    /// Settings for the request dispatcher.
    pub fn dispatcher(&self) -> DispatcherConfig {
        DispatcherConfig {
            source: self.bus.source.clone(),
            topic: self.bus.request_topic.clone(),
            deadline: self.bus.dispatch_deadline,
        }
    }

    /// Settings for the status consumer.
    pub fn consumer(&self) -> ConsumerConfig {
        ConsumerConfig {
            topic: self.bus.status_topic.clone(),
            deadline: self.reconcile.deadline,
            retry: RetryPolicy {
                max_attempts: self.reconcile.max_attempts,
                initial_backoff: self.reconcile.initial_backoff,
                max_backoff: self.reconcile.max_backoff,
            },
        }
    }
}

/// Message bus configuration.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Outbound `transaction.request` topic.
    pub request_topic: String,
    /// Inbound `transaction.status` topic.
    pub status_topic: String,
    /// Envelope `source` attribute on outbound requests.
    pub source: String,
    /// Broadcast channel capacity.
    pub capacity: usize,
    /// Deadline for one publish.
    pub dispatch_deadline: Duration,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            request_topic: DEFAULT_REQUEST_TOPIC.to_string(),
            status_topic: DEFAULT_STATUS_TOPIC.to_string(),
            source: DEFAULT_SOURCE.to_string(),
            capacity: shared_bus::DEFAULT_CHANNEL_CAPACITY,
            dispatch_deadline: Duration::from_secs(5),
        }
    }
}

/// Signing domain and target contract.
#[derive(Debug, Clone)]
pub struct SigningDomainConfig {
    pub name: String,
    pub version: String,
    pub chain_id: u64,
    /// MUST be overridden in production.
    pub verifying_contract: Address,
    /// Contract the requests are sent to. Defaults to the verifying contract.
    pub registry_contract: Option<Address>,
}

impl SigningDomainConfig {
    pub fn registry_contract(&self) -> Address {
        self.registry_contract.unwrap_or(self.verifying_contract)
    }
}

impl Default for SigningDomainConfig {
    fn default() -> Self {
        Self {
            name: "DIMO".to_string(),
            version: "1".to_string(),
            chain_id: 137,
            verifying_contract: [0u8; 20],
            registry_contract: None,
        }
    }
}

/// Status consumer and engine configuration.
#[derive(Debug, Clone)]
pub struct ReconcileConfig {
    /// Total attempts for a notification whose request is not yet stored.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    /// Deadline for one reconciliation attempt.
    pub deadline: Duration,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        let retry = RetryPolicy::default();
        Self {
            max_attempts: retry.max_attempts,
            initial_backoff: retry.initial_backoff,
            max_backoff: retry.max_backoff,
            deadline: ConsumerConfig::default().deadline,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

/// Load configuration from the process environment.
pub fn load_config() -> (RuntimeConfig, Vec<IgnoredOverride>) {
    load_config_from(|key| std::env::var(key).ok())
}

/// Load configuration from an arbitrary variable source.
pub fn load_config_from<F>(lookup: F) -> (RuntimeConfig, Vec<IgnoredOverride>)
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = RuntimeConfig::default();
    let mut env = Overrides {
        lookup,
        ignored: Vec::new(),
    };

    env.string("MTX_REQUEST_TOPIC", &mut config.bus.request_topic);
    env.string("MTX_STATUS_TOPIC", &mut config.bus.status_topic);
    env.string("MTX_SOURCE", &mut config.bus.source);
    env.parsed("MTX_BUS_CAPACITY", &mut config.bus.capacity);
    env.millis("MTX_DISPATCH_DEADLINE_MS", &mut config.bus.dispatch_deadline);

    env.string("MTX_DOMAIN_NAME", &mut config.signing.name);
    env.string("MTX_DOMAIN_VERSION", &mut config.signing.version);
    env.parsed("MTX_CHAIN_ID", &mut config.signing.chain_id);
    env.address("MTX_VERIFYING_CONTRACT", &mut config.signing.verifying_contract);
    let mut registry = config.signing.registry_contract();
    if env.address("MTX_REGISTRY_CONTRACT", &mut registry) {
        config.signing.registry_contract = Some(registry);
    }

    env.parsed("MTX_RETRY_ATTEMPTS", &mut config.reconcile.max_attempts);
    env.millis("MTX_RETRY_BACKOFF_MS", &mut config.reconcile.initial_backoff);
    env.millis("MTX_RETRY_MAX_BACKOFF_MS", &mut config.reconcile.max_backoff);
    env.millis("MTX_RECONCILE_DEADLINE_MS", &mut config.reconcile.deadline);

    env.parsed("MTX_LOG_LEVEL", &mut config.log.level);

    (config, env.ignored)
}

struct Overrides<F> {
    lookup: F,
    ignored: Vec<IgnoredOverride>,
}

impl<F: Fn(&str) -> Option<String>> Overrides<F> {
    fn string(&mut self, key: &'static str, target: &mut String) {
        match (self.lookup)(key) {
            Some(value) if !value.trim().is_empty() => *target = value.trim().to_string(),
            Some(value) => self.ignored.push(IgnoredOverride { key, value }),
            None => {}
        }
    }

    fn parsed<T: FromStr>(&mut self, key: &'static str, target: &mut T) -> bool {
        let Some(value) = (self.lookup)(key) else {
            return false;
        };
        match value.trim().parse() {
            Ok(v) => {
                *target = v;
                true
            }
            Err(_) => {
                self.ignored.push(IgnoredOverride { key, value });
                false
            }
        }
    }

    fn millis(&mut self, key: &'static str, target: &mut Duration) {
        let mut ms = 0u64;
        if self.parsed(key, &mut ms) {
            *target = Duration::from_millis(ms);
        }
    }

    fn address(&mut self, key: &'static str, target: &mut Address) -> bool {
        let Some(value) = (self.lookup)(key) else {
            return false;
        };
        match parse_address("address", value.trim()) {
            Ok(a) => {
                *target = a;
                true
            }
            Err(_) => {
                self.ignored.push(IgnoredOverride { key, value });
                false
            }
        }
    }
}

impl std::fmt::Display for IgnoredOverride {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={:?}", self.key, self.value)
    }
}
