//! # Node Runtime Library
//!
//! Configuration and wiring for the meta-transaction service. The binary in
//! `main.rs` only installs logging, loads the configuration and drives the
//! [`MetaTxRuntime`] lifecycle; everything here is usable from tests.
//!
//! ## Wiring
//!
//! ```text
//! caller ──authorize_and_dispatch──→ RequestDispatcher ──transaction.request──→ [Bus] ──→ relayer
//!                                                                                          │
//! ReconciliationEngine ←── StatusConsumer ←──────────────────transaction.status──── [Bus] ←┘
//! ```

pub mod config;
pub mod runtime;

pub use config::{load_config, load_config_from, ConfigError, IgnoredOverride, RuntimeConfig};
pub use runtime::{MetaTxRuntime, RuntimeError};
