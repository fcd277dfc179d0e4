//! # Gateway Container
//!
//! Owns every shared component and hands out clones to the tasks that need
//! them. Construction only builds state; nothing is spawned or bound here.

use std::sync::Arc;

use anyhow::{Context, Result};
use shared_bus::InMemoryBroker;
use tq_01_name_index::{InMemoryIdentityStore, NameIndexConfig, NameIndexService, MAX_SEARCH_LIMIT};
use tq_02_queue_notifier::{ConnectionRegistry, InMemoryQueueStore, NotifierObserver, WsState};
use tracing::info;

use crate::config::GatewayConfig;
use crate::observer::MetricsObserver;
use crate::queue_ops::QueueWriter;

/// Name index service as wired in the gateway.
pub type GatewayNameIndex = NameIndexService<InMemoryIdentityStore>;

/// Shared gateway components.
pub struct GatewayContainer {
    pub config: GatewayConfig,
    pub registry: ConnectionRegistry,
    pub queue_store: Arc<InMemoryQueueStore>,
    pub broker: Arc<InMemoryBroker>,
    pub identity_store: Arc<InMemoryIdentityStore>,
    pub name_index: Arc<GatewayNameIndex>,
    pub observer: Arc<dyn NotifierObserver>,
}

impl GatewayContainer {
    /// Build components from configuration.
    ///
    /// Fails if the configured identities file cannot be read.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        let identity_store = match &config.identities_file {
            Some(path) => {
                let store = InMemoryIdentityStore::from_json_file(path)
                    .with_context(|| format!("Failed to load identities from {}", path.display()))?;
                info!(path = %path.display(), identities = store.len(), "Identity store loaded");
                store
            }
            None => InMemoryIdentityStore::new(),
        };
        Ok(Self::with_identity_store(config, Arc::new(identity_store)))
    }

    /// Build components around an existing identity store.
    pub fn with_identity_store(
        config: GatewayConfig,
        identity_store: Arc<InMemoryIdentityStore>,
    ) -> Self {
        let name_index = NameIndexService::new(
            NameIndexConfig {
                default_limit: config.search_limit,
                max_limit: MAX_SEARCH_LIMIT.max(config.search_limit),
            },
            identity_store.clone(),
        )
        .with_observer(Arc::new(MetricsObserver));

        Self {
            registry: ConnectionRegistry::new(),
            queue_store: Arc::new(InMemoryQueueStore::new()),
            broker: Arc::new(InMemoryBroker::with_capacity(config.broker_capacity)),
            identity_store,
            name_index: Arc::new(name_index),
            observer: Arc::new(MetricsObserver),
            config,
        }
    }

    /// State for the WebSocket upgrade handler.
    #[must_use]
    pub fn ws_state(&self) -> WsState {
        WsState::new(self.registry.clone(), self.config.ws_buffer)
            .with_observer(self.observer.clone())
    }

    /// Writer that mutates the queue and announces changes.
    #[must_use]
    pub fn queue_writer(&self) -> QueueWriter {
        QueueWriter::new(self.queue_store.clone(), self.broker.clone())
    }
}
