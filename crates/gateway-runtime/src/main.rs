//! # TutorQ Gateway
//!
//! Loads configuration, initializes telemetry and serves until Ctrl+C.

use anyhow::{Context, Result};
use gateway_runtime::{GatewayConfig, GatewayRuntime};
use tq_telemetry::{init_telemetry, TelemetryConfig};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = GatewayConfig::from_env().context("Invalid gateway configuration")?;
    info!(addr = %config.addr, ws_path = %config.ws_path, "Starting TutorQ gateway");

    let runtime = GatewayRuntime::new(config)?;
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    runtime.run_until(shutdown).await?;
    info!("Gateway stopped");
    Ok(())
}
