//! Prometheus metrics for the gateway.
//!
//! All metrics follow the naming convention: `tq_<subsystem>_<metric>[_total]`
//!
//! ## Metric Types
//!
//! - **Counter**: Monotonically increasing value (e.g., notifier_broadcasts_total)
//! - **Gauge**: Value that can go up or down (e.g., connections_active)

use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // NOTIFIER METRICS (tq-02)
    // =========================================================================

    /// Broadcast cycles completed
    pub static ref NOTIFIER_BROADCASTS: IntCounter = IntCounter::new(
        "tq_notifier_broadcasts_total",
        "Total queue broadcasts fanned out to connections"
    ).expect("metric creation failed");

    /// Frames accepted by connections
    pub static ref NOTIFIER_FRAMES_DELIVERED: IntCounter = IntCounter::new(
        "tq_notifier_frames_delivered_total",
        "Total frames accepted by connection transports"
    ).expect("metric creation failed");

    /// Deliveries acknowledged without broadcasting
    pub static ref NOTIFIER_DELIVERIES_DROPPED: IntCounter = IntCounter::new(
        "tq_notifier_deliveries_dropped_total",
        "Total broker deliveries dropped as malformed"
    ).expect("metric creation failed");

    /// Connections removed after a failed write
    pub static ref NOTIFIER_CONNECTIONS_PRUNED: IntCounter = IntCounter::new(
        "tq_notifier_connections_pruned_total",
        "Total connections closed after a failed write"
    ).expect("metric creation failed");

    /// Registered connections
    pub static ref CONNECTIONS_ACTIVE: IntGauge = IntGauge::new(
        "tq_connections_active",
        "Number of registered WebSocket connections"
    ).expect("metric creation failed");

    // =========================================================================
    // NAME INDEX METRICS (tq-01)
    // =========================================================================

    /// Indexed (fragment, user) pairs
    pub static ref NAME_INDEX_ENTRIES: IntGauge = IntGauge::new(
        "tq_name_index_entries",
        "Number of (name fragment, user id) pairs in the name index"
    ).expect("metric creation failed");
}

/// Proof that the metrics are registered.
#[derive(Debug, Clone, Copy)]
pub struct MetricsHandle {
    _private: (),
}

/// Register all metrics with the global registry.
///
/// Safe to call more than once; metrics already registered are skipped.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Notifier
        Box::new(NOTIFIER_BROADCASTS.clone()),
        Box::new(NOTIFIER_FRAMES_DELIVERED.clone()),
        Box::new(NOTIFIER_DELIVERIES_DROPPED.clone()),
        Box::new(NOTIFIER_CONNECTIONS_PRUNED.clone()),
        Box::new(CONNECTIONS_ACTIVE.clone()),
        // Name index
        Box::new(NAME_INDEX_ENTRIES.clone()),
    ];

    for metric in metrics {
        match REGISTRY.register(metric) {
            Ok(()) | Err(prometheus::Error::AlreadyReg) => {}
            Err(e) => return Err(TelemetryError::MetricsInit(e.to_string())),
        }
    }

    Ok(MetricsHandle { _private: () })
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
