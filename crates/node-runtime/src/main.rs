//! # Meta-Transaction Node
//!
//! Entry point for the meta-transaction service.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults plus `MTX_*` environment overrides)
//! 2. Initialize logging at the configured level
//! 3. Validate the configuration and wire the services
//! 4. Start the status consumer
//! 5. Run until Ctrl+C, then stop the consumer and close the bus

use anyhow::{Context, Result};
use node_runtime::{load_config, MetaTxRuntime};
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let (config, ignored) = load_config();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log.level)
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install log subscriber")?;

    for o in &ignored {
        warn!(key = o.key, value = %o.value, "Ignoring invalid configuration override");
    }

    let runtime = MetaTxRuntime::new(config).context("Failed to initialize runtime")?;
    runtime.start().context("Failed to start status consumer")?;

    info!("Node is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;

    Ok(())
}
