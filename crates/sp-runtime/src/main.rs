//! Subscription protocol indexer and payment scheduler.
//!
//! See the library documentation for the startup sequence. Configuration
//! is read from the environment; `PROGRAM_ID` is required, and
//! `PAYER_SECRET_KEY` is required unless `SP_SCHEDULER_ENABLED=false`.

use std::sync::Arc;

use anyhow::{Context, Result};
use shared_types::{SystemTimeSource, TimeSource};
use sp_01_chain_gateway::SolanaGateway;
use sp_03_ledger_store::{LedgerRepository, LedgerStore};
use sp_06_webhook_notifier::HttpTransport;
use sp_runtime::{Runtime, RuntimeConfig, StoreBackend};
use sp_telemetry::{encode_metrics, init_telemetry};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = RuntimeConfig::from_env().context("Invalid configuration")?;
    let _telemetry =
        init_telemetry(config.telemetry.clone()).context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Subscription Protocol v{}", env!("CARGO_PKG_VERSION"));
    info!("  Program: {}", config.gateway.program_id);
    info!("  RPC: {}", config.gateway.rpc_url);
    info!("===========================================");

    let time: Arc<dyn TimeSource> = Arc::new(SystemTimeSource);

    match config.store.backend {
        StoreBackend::Memory => {
            info!("[sp-runtime] Using in-memory ledger store");
            let store = Arc::new(LedgerStore::in_memory_with_clock(time.clone()));
            run(config, store, time).await
        }
        StoreBackend::RocksDb => {
            let store = Arc::new(open_rocksdb(&config, time.clone())?);
            run(config, store, time).await
        }
    }
}

async fn run<S: LedgerRepository + 'static>(
    config: RuntimeConfig,
    store: Arc<S>,
    time: Arc<dyn TimeSource>,
) -> Result<()> {
    let gateway = Arc::new(
        SolanaGateway::new(config.gateway.clone()).context("Failed to create chain gateway")?,
    );
    if let Some(payer) = gateway.payer_address() {
        info!("[sp-runtime] Payment fee payer: {}", payer);
    }
    let transport =
        Arc::new(HttpTransport::new(&config.webhook).context("Failed to build webhook client")?);

    let mut runtime = Runtime::new(&config, gateway, store, transport, time);
    runtime.start().await.context("Indexer startup failed")?;

    info!("[sp-runtime] Running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown().await;
    if let Ok(metrics) = encode_metrics() {
        debug!("[sp-runtime] Final metrics:\n{}", metrics);
    }
    Ok(())
}

#[cfg(feature = "rocksdb")]
fn open_rocksdb(
    config: &RuntimeConfig,
    time: Arc<dyn TimeSource>,
) -> Result<LedgerStore<sp_03_ledger_store::RocksDbStore>> {
    use sp_03_ledger_store::{RocksDbConfig, RocksDbStore};

    let path = config.store.ledger_path();
    info!("[sp-runtime] Opening RocksDB ledger store at {}", path.display());
    let kv = RocksDbStore::open(RocksDbConfig {
        path: path.to_string_lossy().into_owned(),
        ..RocksDbConfig::default()
    })
    .with_context(|| format!("Failed to open ledger store at {}", path.display()))?;
    Ok(LedgerStore::new(kv, time))
}

// RuntimeConfig::validate rejects this backend when the feature is off.
#[cfg(not(feature = "rocksdb"))]
fn open_rocksdb(
    _config: &RuntimeConfig,
    _time: Arc<dyn TimeSource>,
) -> Result<LedgerStore<sp_03_ledger_store::InMemoryKVStore>> {
    anyhow::bail!("built without the rocksdb feature")
}
