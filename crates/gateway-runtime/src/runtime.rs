//! # Gateway Runtime
//!
//! ## Startup Sequence
//!
//! 1. Seed the name index from the identity store
//! 2. Take the broker's consumer and spawn the notifier task
//! 3. Bind the listener and serve the WebSocket upgrade endpoint
//!
//! ## Shutdown Sequence
//!
//! 1. Stop accepting connections, close every registered connection
//! 2. Close the broker; the notifier drains buffered deliveries and exits
//! 3. Wait for the notifier (bounded), then close anything still registered

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tq_01_name_index::NameIndexApi;
use tq_02_queue_notifier::{adapters::router as ws_router, FanoutNotifier, NotifierSummary};
use tq_telemetry::encode_metrics;
use tracing::{error, info, warn};

use crate::config::GatewayConfig;
use crate::container::GatewayContainer;

/// How long shutdown waits for the notifier to drain.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// The gateway process.
pub struct GatewayRuntime {
    container: Arc<GatewayContainer>,
    notifier: Option<JoinHandle<NotifierSummary>>,
}

impl GatewayRuntime {
    /// Create a runtime from configuration.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Ok(Self::from_container(GatewayContainer::new(config)?))
    }

    pub fn from_container(container: GatewayContainer) -> Self {
        Self {
            container: Arc::new(container),
            notifier: None,
        }
    }

    #[must_use]
    pub fn container(&self) -> &Arc<GatewayContainer> {
        &self.container
    }

    /// Seed the name index and spawn the notifier.
    pub async fn start(&mut self) -> Result<()> {
        let identities = self
            .container
            .name_index
            .seed()
            .await
            .context("Failed to seed name index")?;
        info!(identities, "Name index ready");

        let consumer = self
            .container
            .broker
            .consume()
            .context("Queue broker already has a consumer")?;
        let notifier = FanoutNotifier::new(
            self.container.registry.clone(),
            self.container.queue_store.clone(),
        )
        .with_observer(self.container.observer.clone());
        self.notifier = Some(tokio::spawn(notifier.run(consumer)));

        Ok(())
    }

    /// HTTP surface: the WebSocket upgrade endpoint and `/metrics`.
    pub fn router(&self) -> Router {
        ws_router(&self.container.config.ws_path, self.container.ws_state())
            .route("/metrics", get(metrics_handler))
    }

    /// Serve on `listener` until `shutdown` resolves.
    ///
    /// Registered connections are closed as soon as `shutdown` fires so the
    /// server is not held open by long-lived sockets.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let registry = self.container.registry.clone();
        let observer = self.container.observer.clone();
        let signal = async move {
            shutdown.await;
            let closed = registry.close_all().await;
            observer.connections_changed(0);
            info!(closed, "Shutdown signal received, connections closed");
        };

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await
            .context("Server error")
    }

    /// Close the broker, let the notifier drain, then close any remaining
    /// connections.
    pub async fn shutdown(&mut self) -> Result<NotifierSummary> {
        info!("Initiating graceful shutdown...");
        self.container.broker.close();
        let drained = self.drain_notifier().await;
        self.container.registry.close_all().await;
        drained
    }

    async fn drain_notifier(&mut self) -> Result<NotifierSummary> {
        let Some(handle) = self.notifier.take() else {
            return Ok(NotifierSummary::default());
        };
        match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
            Ok(Ok(summary)) => {
                info!("Shutdown complete");
                Ok(summary)
            }
            Ok(Err(e)) => {
                error!(error = %e, "Notifier task failed");
                Err(e).context("Notifier task failed")
            }
            Err(_) => {
                warn!(grace = ?SHUTDOWN_GRACE, "Notifier did not drain in time");
                Ok(NotifierSummary::default())
            }
        }
    }

    /// Start, bind, serve until `shutdown` resolves, then shut down.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.start().await?;

        let addr = self.container.config.addr;
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind {addr}"))?;
        info!(
            addr = %listener.local_addr().unwrap_or(addr),
            ws_path = %self.container.config.ws_path,
            "Gateway listening"
        );

        self.serve(listener, shutdown).await?;
        self.shutdown().await?;
        Ok(())
    }
}

async fn metrics_handler() -> Response {
    match encode_metrics() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
