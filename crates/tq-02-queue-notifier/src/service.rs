//! # Fan-out Notifier
//!
//! Drains queue-change deliveries from the broker and pushes the resulting
//! queue state to every registered connection.
//!
//! ## Broadcast Cycle
//!
//! ```text
//! recv delivery ──→ decode QueueEvent ──(malformed)──→ ack, drop
//!                        │
//!                        ▼
//!            lock registry (broadcast lock)
//!                        │
//!            fetch queue (NotFound → empty, error → last known)
//!                        │
//!            per connection: write frame ──(fails)──→ close + remove
//!                        │
//!                       ack
//!                        │
//!                     unlock
//! ```
//!
//! Every delivery is acknowledged exactly once, positively, whatever happens
//! to individual connections. A rebroadcast of the same state is harmless, so
//! broker redeliveries need no deduplication.

use std::sync::Arc;

use shared_bus::{Delivery, DeliverySource, QueueEvent};
use shared_types::QuestionQueue;
use tracing::{debug, error, info, warn};

use crate::domain::{ConnectionRegistry, QueueStoreError, RolePayloads};
use crate::ports::{NoopObserver, NotifierObserver, QueueStore};

/// What happened to one delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The queue state was written to the registered connections.
    Broadcast {
        /// Connections that accepted the frame.
        delivered: usize,
        /// Connections closed and removed after a failed write.
        pruned: usize,
    },
    /// The delivery was acknowledged without broadcasting.
    Dropped,
}

/// Totals for a notifier run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NotifierSummary {
    pub deliveries: u64,
    pub broadcasts: u64,
    pub dropped: u64,
    pub pruned: u64,
}

impl NotifierSummary {
    fn record(&mut self, outcome: DeliveryOutcome) {
        self.deliveries += 1;
        match outcome {
            DeliveryOutcome::Broadcast { pruned, .. } => {
                self.broadcasts += 1;
                self.pruned += pruned as u64;
            }
            DeliveryOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Fan-out notifier.
///
/// Owns the last successfully fetched queue so that a failing queue store
/// still yields a best-effort broadcast.
pub struct FanoutNotifier<Q: QueueStore> {
    registry: ConnectionRegistry,
    queue_store: Arc<Q>,
    observer: Arc<dyn NotifierObserver>,
    last_known: QuestionQueue,
}

impl<Q: QueueStore> FanoutNotifier<Q> {
    /// Create a notifier over `registry` reading from `queue_store`.
    pub fn new(registry: ConnectionRegistry, queue_store: Arc<Q>) -> Self {
        Self {
            registry,
            queue_store,
            observer: Arc::new(NoopObserver),
            last_known: QuestionQueue::default(),
        }
    }

    /// Attach lifecycle hooks.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn NotifierObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The queue used by the most recent broadcast.
    #[must_use]
    pub fn last_known_queue(&self) -> &QuestionQueue {
        &self.last_known
    }

    /// Drain `source` until the broker closes it.
    pub async fn run<S: DeliverySource>(mut self, mut source: S) -> NotifierSummary {
        info!("Queue notifier started");
        let mut summary = NotifierSummary::default();

        while let Some(delivery) = source.recv().await {
            let outcome = self.handle_delivery(delivery).await;
            summary.record(outcome);
        }

        info!(
            deliveries = summary.deliveries,
            broadcasts = summary.broadcasts,
            dropped = summary.dropped,
            pruned = summary.pruned,
            "Broker channel closed, queue notifier stopped"
        );
        summary
    }

    /// Process one delivery: broadcast, prune, acknowledge.
    pub async fn handle_delivery(&mut self, delivery: Delivery) -> DeliveryOutcome {
        let delivery_tag = delivery.delivery_tag();

        let event = match QueueEvent::decode(delivery.body()) {
            Ok(event) => event,
            Err(e) => {
                warn!(delivery_tag, error = %e, "Dropping malformed queue event");
                self.observer.delivery_dropped();
                settle(delivery).await;
                return DeliveryOutcome::Dropped;
            }
        };
        debug!(
            delivery_tag,
            kind = event.kind(),
            user_id = event.user_id().unwrap_or_default(),
            redelivered = delivery.redelivered(),
            "Queue event received"
        );

        let registry = self.registry.clone();
        let mut connections = registry.lock().await;

        self.refresh_snapshot().await;
        let payloads = match RolePayloads::build(&self.last_known) {
            Ok(payloads) => payloads,
            Err(e) => {
                error!(delivery_tag, error = %e, "Failed to serialize queue payloads");
                self.observer.delivery_dropped();
                settle(delivery).await;
                return DeliveryOutcome::Dropped;
            }
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, connection) in connections.iter() {
            let frame = match payloads.frame_for(connection.role, id) {
                Ok(frame) => frame,
                Err(e) => {
                    error!(connection_id = %id, error = %e, "Failed to serialize payload");
                    continue;
                }
            };
            match connection.handle.write_text(&frame) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(
                        connection_id = %id,
                        role = %connection.role,
                        error = %e,
                        "Write failed, pruning connection"
                    );
                    failed.push(id.clone());
                }
            }
        }

        let pruned = failed.len();
        for id in failed {
            if let Some(connection) = connections.remove(&id) {
                connection.handle.close();
            }
        }
        if pruned > 0 {
            self.observer.connections_changed(connections.len());
        }

        settle(delivery).await;
        drop(connections);

        debug!(
            delivery_tag,
            delivered,
            pruned,
            queue_length = payloads.queue_length(),
            "Broadcast complete"
        );
        self.observer.broadcast_completed(delivered, pruned);
        DeliveryOutcome::Broadcast { delivered, pruned }
    }

    async fn refresh_snapshot(&mut self) {
        match self.queue_store.current_queue().await {
            Ok(queue) => self.last_known = queue,
            Err(QueueStoreError::NotFound) => self.last_known = QuestionQueue::default(),
            Err(e) => warn!(
                error = %e,
                queue_length = self.last_known.len(),
                "Queue store failed, broadcasting last known queue"
            ),
        }
    }
}

/// Positive acknowledgment. A failed ack is logged; the broker redelivers.
async fn settle(delivery: Delivery) {
    let delivery_tag = delivery.delivery_tag();
    if let Err(e) = delivery.ack().await {
        warn!(delivery_tag, error = %e, "Failed to acknowledge delivery");
    }
}
