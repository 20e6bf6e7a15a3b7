//! # Runtime Configuration
//!
//! Aggregates every subsystem's configuration. Each part reads its own
//! environment variables; this module adds the store selection and the
//! cross-cutting checks that need more than one part.
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SP_STORE_BACKEND` | `rocksdb` with the feature, else `memory` | projection backend |
//! | `SP_DATA_DIR` | `./data` | RocksDB parent directory |
//! | `SP_SCHEDULER_ENABLED` | `true` | run the payment sweep and maintenance |

use std::env;
use std::fmt;
use std::path::PathBuf;

use sp_01_chain_gateway::{GatewayConfig, GatewayError};
use sp_04_indexer::IndexerConfig;
use sp_05_payment_scheduler::SchedulerConfig;
use sp_06_webhook_notifier::WebhookConfig;
use sp_telemetry::TelemetryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    RocksDb,
}

impl StoreBackend {
    fn compiled_default() -> Self {
        if cfg!(feature = "rocksdb") {
            StoreBackend::RocksDb
        } else {
            StoreBackend::Memory
        }
    }
}

impl std::str::FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" | "in-memory" => Ok(StoreBackend::Memory),
            "rocksdb" => Ok(StoreBackend::RocksDb),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub data_dir: PathBuf,
}

impl StoreConfig {
    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join("ledger")
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::compiled_default(),
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub gateway: GatewayConfig,
    pub indexer: IndexerConfig,
    pub scheduler: SchedulerConfig,
    pub webhook: WebhookConfig,
    pub store: StoreConfig,
    pub telemetry: TelemetryConfig,
    pub scheduler_enabled: bool,
}

impl RuntimeConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let gateway = GatewayConfig::from_env().map_err(ConfigError::Gateway)?;
        let indexer = IndexerConfig::from_env(gateway.program_id);

        let mut store = StoreConfig::default();
        if let Ok(backend) = env::var("SP_STORE_BACKEND") {
            store.backend = backend.parse()?;
        }
        if let Ok(dir) = env::var("SP_DATA_DIR") {
            store.data_dir = PathBuf::from(dir);
        }

        let scheduler_enabled = env::var("SP_SCHEDULER_ENABLED")
            .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
            .unwrap_or(true);

        let config = Self {
            gateway,
            indexer,
            scheduler: SchedulerConfig::from_env(),
            webhook: WebhookConfig::from_env(),
            store,
            telemetry: TelemetryConfig::from_env(),
            scheduler_enabled,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks that span more than one subsystem.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.indexer.program_id != self.gateway.program_id {
            return Err(ConfigError::ProgramMismatch);
        }
        if self.scheduler_enabled && self.gateway.payer_secret_key.is_none() {
            return Err(ConfigError::MissingPayer);
        }
        if self.store.backend == StoreBackend::RocksDb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::BackendUnavailable(self.store.backend));
        }
        Ok(())
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Gateway(GatewayError),
    UnknownBackend(String),
    BackendUnavailable(StoreBackend),
    /// The scheduler signs payments and cannot run read-only.
    MissingPayer,
    ProgramMismatch,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Gateway(e) => write!(f, "gateway configuration: {}", e),
            ConfigError::UnknownBackend(name) => {
                write!(f, "unknown store backend {:?} (expected memory or rocksdb)", name)
            }
            ConfigError::BackendUnavailable(backend) => write!(
                f,
                "store backend {:?} requested but the binary was built without it",
                backend
            ),
            ConfigError::MissingPayer => write!(
                f,
                "PAYER_SECRET_KEY is required while the scheduler is enabled. \
                 Set it or run with SP_SCHEDULER_ENABLED=false."
            ),
            ConfigError::ProgramMismatch => {
                write!(f, "indexer and gateway are configured for different programs")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Gateway(e) => Some(e),
            _ => None,
        }
    }
}
