//! Prometheus metrics for the ledger subsystems.
//!
//! All metrics follow the naming convention: `ls_<subsystem>_<metric>_<unit>`

use lazy_static::lazy_static;
use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts,
    Registry, TextEncoder,
};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // CHAIN GATEWAY METRICS (Subsystem 1)
    // =========================================================================

    /// Wallet session acquisitions by outcome
    pub static ref WALLET_ACQUIRE: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_wallet_acquire_total", "Wallet session acquisitions"),
        &["outcome"]
    ).expect("metric creation failed");

    /// Contract calls by operation and outcome
    pub static ref GATEWAY_CALLS: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_gateway_calls_total", "Contract calls submitted through the gateway"),
        &["operation", "outcome"]
    ).expect("metric creation failed");

    /// Buffered gas limit attached to submitted transactions
    pub static ref GATEWAY_GAS_LIMIT: Histogram = Histogram::with_opts(
        HistogramOpts::new("ls_gateway_gas_limit", "Gas limit sent with each transaction")
            .buckets(exponential_buckets(21_000.0, 2.0, 10).expect("valid buckets"))
    ).expect("metric creation failed");

    // =========================================================================
    // RECONCILIATION METRICS (Subsystem 2)
    // =========================================================================

    /// Coordinator outcomes by operation
    pub static ref RECONCILIATION_OUTCOMES: IntCounterVec = IntCounterVec::new(
        Opts::new("ls_reconciliation_outcomes_total", "Coordinator results by operation"),
        &["operation", "outcome"]
    ).expect("metric creation failed");

    /// Incidents awaiting operator reconciliation
    pub static ref INCIDENTS_PENDING: IntGauge = IntGauge::new(
        "ls_reconciliation_incidents_pending",
        "Reconciliation incidents not yet resolved"
    ).expect("metric creation failed");
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once.
pub fn register_metrics() -> Result<(), TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(WALLET_ACQUIRE.clone()),
        Box::new(GATEWAY_CALLS.clone()),
        Box::new(GATEWAY_GAS_LIMIT.clone()),
        Box::new(RECONCILIATION_OUTCOMES.clone()),
        Box::new(INCIDENTS_PENDING.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
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

/// Count one wallet acquisition.
pub fn record_wallet_acquire(outcome: &str) {
    WALLET_ACQUIRE.with_label_values(&[outcome]).inc();
}

/// Count one gateway call.
pub fn record_gateway_call(operation: &str, outcome: &str) {
    GATEWAY_CALLS.with_label_values(&[operation, outcome]).inc();
}

/// Observe the gas limit of a submitted transaction.
pub fn observe_gas_limit(gas_limit: u64) {
    GATEWAY_GAS_LIMIT.observe(gas_limit as f64);
}

/// Count one coordinator outcome.
pub fn record_reconciliation(operation: &str, outcome: &str) {
    RECONCILIATION_OUTCOMES
        .with_label_values(&[operation, outcome])
        .inc();
}

/// An incident was opened.
pub fn record_incident_opened() {
    INCIDENTS_PENDING.inc();
}

/// An incident was resolved.
pub fn record_incident_resolved() {
    INCIDENTS_PENDING.dec();
}
