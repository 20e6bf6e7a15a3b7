//! Prometheus metrics for the indexer, scheduler and webhook notifier.
//!
//! All metrics follow the naming convention: `sp_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Counter, CounterVec, Encoder, Gauge, HistogramOpts, HistogramVec, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // INDEXER METRICS
    // =========================================================================

    /// Events applied to the store, by event name and outcome
    pub static ref EVENTS_INDEXED: CounterVec = CounterVec::new(
        Opts::new("sp_indexer_events_total", "Program events dispatched to the store"),
        &["event", "outcome"]  // outcome: applied/duplicate/failed
    ).expect("metric creation failed");

    /// Log lines or frames the parser could not turn into a known event
    pub static ref EVENTS_DROPPED: Counter = Counter::new(
        "sp_indexer_events_dropped_total",
        "Unknown or malformed program events dropped"
    ).expect("metric creation failed");

    /// Last slot persisted as the indexing checkpoint
    pub static ref LAST_PROCESSED_SLOT: Gauge = Gauge::new(
        "sp_indexer_last_processed_slot",
        "Slot of the last persisted indexing checkpoint"
    ).expect("metric creation failed");

    /// Full account sync runs by outcome
    pub static ref FULL_SYNC_RUNS: CounterVec = CounterVec::new(
        Opts::new("sp_indexer_full_sync_runs_total", "Full account reconciliation runs"),
        &["outcome"]  // outcome: completed/failed/skipped
    ).expect("metric creation failed");

    // =========================================================================
    // SCHEDULER METRICS
    // =========================================================================

    /// Payment executions by outcome
    pub static ref PAYMENTS: CounterVec = CounterVec::new(
        Opts::new("sp_scheduler_payments_total", "Scheduled payment executions"),
        &["outcome"]  // outcome: completed/retry/failed
    ).expect("metric creation failed");

    /// Rows found stuck in processing and recovered by the reaper
    pub static ref STUCK_PAYMENTS_REAPED: Counter = Counter::new(
        "sp_scheduler_stuck_payments_reaped_total",
        "Payments recovered from a stuck processing state"
    ).expect("metric creation failed");

    /// Time spent executing a single payment, submission to confirmation
    pub static ref PAYMENT_DURATION: HistogramVec = HistogramVec::new(
        HistogramOpts::new(
            "sp_scheduler_payment_duration_seconds",
            "Time spent executing a scheduled payment"
        ).buckets(exponential_buckets(0.05, 2.0, 10).unwrap_or_default()),
        &["outcome"]
    ).expect("metric creation failed");

    // =========================================================================
    // WEBHOOK METRICS
    // =========================================================================

    /// Webhook deliveries by event and outcome
    pub static ref WEBHOOK_DELIVERIES: CounterVec = CounterVec::new(
        Opts::new("sp_webhook_deliveries_total", "Merchant webhook deliveries"),
        &["event", "outcome"]  // outcome: delivered/failed/skipped
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(EVENTS_INDEXED.clone()),
        Box::new(EVENTS_DROPPED.clone()),
        Box::new(LAST_PROCESSED_SLOT.clone()),
        Box::new(FULL_SYNC_RUNS.clone()),
        Box::new(PAYMENTS.clone()),
        Box::new(STUCK_PAYMENTS_REAPED.clone()),
        Box::new(PAYMENT_DURATION.clone()),
        Box::new(WEBHOOK_DELIVERIES.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(())
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
