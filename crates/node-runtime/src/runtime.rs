//! # Runtime Wiring
//!
//! Builds every service over one shared bus and owns the consumer task.

use crate::config::{ConfigError, RuntimeConfig};
use mt_01_abi_codec::{registry_interface, AbiError};
use mt_02_typed_signing::{Eip712Domain, SigningError, TypedMessageBuilder, TypedSigningApi};
use mt_03_request_dispatch::RequestDispatcher;
use mt_04_reconciliation::{ConsumerStats, EventRegistry, InMemoryRequestStore, ReconciliationEngine, StatusConsumer};
use parking_lot::Mutex;
use shared_bus::InMemoryMessageBus;
use shared_types::{to_hex, Address};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub type Dispatcher = RequestDispatcher<InMemoryMessageBus>;
pub type Engine = ReconciliationEngine<InMemoryRequestStore>;

/// Errors raised while wiring the runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("registry interface: {0}")]
    Interface(#[from] AbiError),

    #[error("signing domain: {0}")]
    Signing(#[from] SigningError),

    #[error("runtime already started")]
    AlreadyStarted,
}

/// The wired service.
pub struct MetaTxRuntime {
    config: RuntimeConfig,
    bus: Arc<InMemoryMessageBus>,
    signing: Arc<TypedMessageBuilder>,
    dispatcher: Arc<Dispatcher>,
    store: Arc<InMemoryRequestStore>,
    engine: Arc<Engine>,
    consumer_stats: Arc<ConsumerStats>,
    consumer_task: Mutex<Option<JoinHandle<()>>>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl MetaTxRuntime {
    /// Validate `config` and build every service.
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        config.validate()?;

        let bus = Arc::new(InMemoryMessageBus::with_capacity(config.bus.capacity));

        let domain = Eip712Domain::new(
            config.signing.name.clone(),
            config.signing.version.clone(),
            config.signing.chain_id,
            config.signing.verifying_contract,
        );
        let signing = Arc::new(TypedMessageBuilder::new(domain)?);

        let interface = Arc::new(registry_interface()?.clone());
        let dispatcher = Arc::new(RequestDispatcher::new(
            Arc::clone(&bus),
            Arc::clone(&signing) as Arc<dyn TypedSigningApi>,
            Arc::clone(&interface),
            config.dispatcher(),
        ));

        let store = Arc::new(InMemoryRequestStore::new());
        let registry = Arc::new(EventRegistry::from_interface(&interface)?);
        info!(events = registry.len(), "Event registry built");
        let engine = Arc::new(ReconciliationEngine::new(Arc::clone(&store), registry));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            bus,
            signing,
            dispatcher,
            store,
            engine,
            consumer_stats: Arc::new(ConsumerStats::default()),
            consumer_task: Mutex::new(None),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Subscribe the status consumer and spawn it.
    ///
    /// The subscription is in place when this returns, so a status
    /// published right afterwards is not missed.
    pub fn start(&self) -> Result<(), RuntimeError> {
        let mut task = self.consumer_task.lock();
        if task.is_some() {
            return Err(RuntimeError::AlreadyStarted);
        }

        info!(
            chain_id = self.config.signing.chain_id,
            verifying_contract = %to_hex(&self.config.signing.verifying_contract),
            registry_contract = %to_hex(&self.registry_contract()),
            request_topic = %self.config.bus.request_topic,
            status_topic = %self.config.bus.status_topic,
            "Starting meta-transaction runtime"
        );

        let consumer = StatusConsumer::new(self.bus.as_ref(), Arc::clone(&self.engine), self.config.consumer())
            .with_stats(Arc::clone(&self.consumer_stats));
        *task = Some(tokio::spawn(consumer.run(self.shutdown_rx.clone())));
        Ok(())
    }

    /// Signal the consumer to stop and wait for it.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        let _ = self.shutdown_tx.send(true);

        let task = self.consumer_task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                warn!(error = %e, "Status consumer task ended abnormally");
            }
        }

        self.bus.close();
        info!("Shutdown complete");
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn registry_contract(&self) -> Address {
        self.config.signing.registry_contract()
    }

    pub fn bus(&self) -> Arc<InMemoryMessageBus> {
        Arc::clone(&self.bus)
    }

    pub fn signing(&self) -> Arc<TypedMessageBuilder> {
        Arc::clone(&self.signing)
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn store(&self) -> Arc<InMemoryRequestStore> {
        Arc::clone(&self.store)
    }

    pub fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.engine)
    }

    pub fn consumer_stats(&self) -> Arc<ConsumerStats> {
        Arc::clone(&self.consumer_stats)
    }
}
