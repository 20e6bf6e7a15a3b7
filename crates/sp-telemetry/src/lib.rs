//! # Subscription Protocol Telemetry
//!
//! Logging and metrics shared by the indexer, scheduler and notifier.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sp_telemetry::{init_telemetry, TelemetryConfig};
//!
//! let _guard = init_telemetry(TelemetryConfig::from_env())?;
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `SP_SERVICE_NAME` | `subscription-protocol` | Service name in logs |
//! | `SP_LOG_LEVEL` / `RUST_LOG` | `info` | Log filter |
//! | `SP_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use metrics::{
    encode_metrics, register_metrics, EVENTS_DROPPED, EVENTS_INDEXED, FULL_SYNC_RUNS,
    LAST_PROCESSED_SLOT, PAYMENTS, PAYMENT_DURATION, STUCK_PAYMENTS_REAPED, WEBHOOK_DELIVERIES,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to install tracing subscriber: {0}")]
    SubscriberInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the process.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    register_metrics()?;
    logging::init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
    })
}

/// Guard that keeps telemetry active. Logs on drop so the final line of a
/// process is always the shutdown marker.
pub struct TelemetryGuard {
    service_name: String,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
