//! # TutorQ Telemetry
//!
//! Logging and metrics for the gateway.
//!
//! ## Components
//!
//! - **Logs**: `tracing` subscriber with an `EnvFilter` and JSON or pretty output
//! - **Metrics**: Prometheus counters and gauges in a process-wide registry
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tq_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() -> anyhow::Result<()> {
//!     let _guard = init_telemetry(TelemetryConfig::from_env())?;
//!     // Logs and metrics are now being collected
//!     Ok(())
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `RUST_LOG` / `TQ_LOG_LEVEL` | `info` | Log filter |
//! | `TQ_JSON_LOGS` | `false` (`true` in containers) | JSON log lines |
//! | `TQ_CONSOLE_OUTPUT` | `true` | Write logs to stdout |
//! | `TQ_SERVICE_NAME` | `tutorq-gateway` | Service name in startup logs |

mod config;
mod logging;
pub mod metrics;

pub use config::{TelemetryConfig, DEFAULT_LOG_LEVEL};
pub use logging::{build_filter, init_logging};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, CONNECTIONS_ACTIVE, NAME_INDEX_ENTRIES,
    NOTIFIER_BROADCASTS, NOTIFIER_CONNECTIONS_PRUNED, NOTIFIER_DELIVERIES_DROPPED,
    NOTIFIER_FRAMES_DELIVERED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Initialize logging and register metrics.
///
/// Returns a guard that should be held for the lifetime of the application.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    // Metrics first so startup code can record immediately
    let metrics = register_metrics()?;
    init_logging(&config)?;

    Ok(TelemetryGuard {
        service_name: config.service_name,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    service_name: String,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!(service = %self.service_name, "Shutting down telemetry");
    }
}
