//! # In-Memory Broker
//!
//! Single-queue, single-consumer broker with explicit acknowledgment.
//! Deliveries the consumer has received but not settled stay in a ledger and
//! are sent again, flagged `redelivered`, by [`InMemoryBroker::recover`].
//! Messages still buffered in the channel are not resent.

use crate::delivery::{AckError, Acknowledger, Delivery};
use crate::subscriber::Consumer;
use crate::DEFAULT_CHANNEL_CAPACITY;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Errors from broker operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BrokerError {
    /// The broker was closed; nothing more can be published.
    #[error("Broker closed")]
    Closed,

    /// The queue already has its consumer.
    #[error("Queue already has a consumer")]
    AlreadyConsumed,
}

/// Trait for publishing message bodies to the broker.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    /// Publish a body, waiting for buffer space if the consumer is behind.
    ///
    /// Returns the delivery tag assigned to the message.
    async fn publish(&self, body: Vec<u8>) -> Result<u64, BrokerError>;

    /// Total messages accepted for delivery.
    fn messages_published(&self) -> u64;
}

#[derive(Debug)]
struct Pending {
    body: Vec<u8>,
    /// Received by the consumer since it was last sent.
    delivered: bool,
}

/// Unsettled messages by tag.
#[derive(Debug, Default)]
pub(crate) struct AckLedger {
    unacked: Mutex<BTreeMap<u64, Pending>>,
    acked: AtomicU64,
}

impl AckLedger {
    fn track(&self, delivery_tag: u64, body: Vec<u8>) {
        self.unacked.lock().insert(
            delivery_tag,
            Pending {
                body,
                delivered: false,
            },
        );
    }

    fn forget(&self, delivery_tag: u64) -> bool {
        self.unacked.lock().remove(&delivery_tag).is_some()
    }

    /// Record that the consumer received `delivery_tag`.
    ///
    /// Returns `false` when the message was already settled, meaning the
    /// copy in hand is stale.
    pub(crate) fn mark_delivered(&self, delivery_tag: u64) -> bool {
        match self.unacked.lock().get_mut(&delivery_tag) {
            Some(pending) => {
                pending.delivered = true;
                true
            }
            None => false,
        }
    }

    /// Take every received-but-unsettled message for resending.
    ///
    /// Taken entries go back to in flight until the consumer receives them
    /// again, so a second recover does not duplicate them.
    fn take_delivered(&self) -> Vec<(u64, Vec<u8>)> {
        self.unacked
            .lock()
            .iter_mut()
            .filter(|(_, pending)| pending.delivered)
            .map(|(tag, pending)| {
                pending.delivered = false;
                (*tag, pending.body.clone())
            })
            .collect()
    }
}

#[async_trait]
impl Acknowledger for AckLedger {
    async fn ack(&self, delivery_tag: u64) -> Result<(), AckError> {
        if !self.forget(delivery_tag) {
            return Err(AckError::UnknownTag(delivery_tag));
        }
        self.acked.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), AckError> {
        if requeue {
            // Stays in the ledger until the next recover.
            return if self.unacked.lock().contains_key(&delivery_tag) {
                Ok(())
            } else {
                Err(AckError::UnknownTag(delivery_tag))
            };
        }
        if self.forget(delivery_tag) {
            Ok(())
        } else {
            Err(AckError::UnknownTag(delivery_tag))
        }
    }
}

/// In-memory implementation of the queue broker.
///
/// Uses a bounded `tokio::sync::mpsc` channel, so delivery order equals
/// publish order and there is exactly one consumer. Suitable for a single
/// gateway process; a deployment with a separate queue service would put an
/// AMQP client behind the same `Delivery`/`Acknowledger` types.
pub struct InMemoryBroker {
    sender: Mutex<Option<mpsc::Sender<Delivery>>>,
    receiver: Mutex<Option<mpsc::Receiver<Delivery>>>,
    ledger: Arc<AckLedger>,
    next_tag: AtomicU64,
    published: AtomicU64,
    capacity: usize,
}

impl InMemoryBroker {
    /// Create a broker with default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create a broker buffering at most `capacity` deliveries.
    ///
    /// A capacity of zero is raised to one.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            ledger: Arc::new(AckLedger::default()),
            next_tag: AtomicU64::new(1),
            published: AtomicU64::new(0),
            capacity,
        }
    }

    /// Take the queue's consumer. Only the first call succeeds.
    pub fn consume(&self) -> Result<Consumer, BrokerError> {
        self.receiver
            .lock()
            .take()
            .map(|receiver| Consumer::new(receiver, self.ledger.clone()))
            .ok_or(BrokerError::AlreadyConsumed)
    }

    /// Redeliver every message the consumer received but has not settled,
    /// in tag order. Messages not yet received are left where they are.
    ///
    /// Returns the number of deliveries re-sent.
    pub async fn recover(&self) -> Result<usize, BrokerError> {
        let sender = self.live_sender()?;
        let outstanding = self.ledger.take_delivered();
        let count = outstanding.len();

        for (tag, body) in outstanding {
            let delivery = Delivery::new(tag, true, body, self.acker());
            sender.send(delivery).await.map_err(|_| BrokerError::Closed)?;
        }

        debug!(redelivered = count, "Broker recovered outstanding deliveries");
        Ok(count)
    }

    /// Stop accepting publishes. The consumer drains what is buffered and
    /// then sees the end of the stream.
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            debug!("Broker closed");
        }
    }

    /// True once [`close`](Self::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.lock().is_none()
    }

    /// Messages published but not yet settled, whether received or not.
    #[must_use]
    pub fn unacked_count(&self) -> usize {
        self.ledger.unacked.lock().len()
    }

    /// Deliveries positively acknowledged.
    #[must_use]
    pub fn acked_count(&self) -> u64 {
        self.ledger.acked.load(Ordering::Relaxed)
    }

    /// Get the channel capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn live_sender(&self) -> Result<mpsc::Sender<Delivery>, BrokerError> {
        self.sender.lock().clone().ok_or(BrokerError::Closed)
    }

    fn acker(&self) -> Arc<dyn Acknowledger> {
        self.ledger.clone()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MessagePublisher for InMemoryBroker {
    async fn publish(&self, body: Vec<u8>) -> Result<u64, BrokerError> {
        let sender = self.live_sender()?;
        let tag = self.next_tag.fetch_add(1, Ordering::Relaxed);

        self.ledger.track(tag, body.clone());
        let delivery = Delivery::new(tag, false, body, self.acker());

        if sender.send(delivery).await.is_err() {
            self.ledger.forget(tag);
            warn!(delivery_tag = tag, "Message dropped (consumer gone)");
            return Err(BrokerError::Closed);
        }

        self.published.fetch_add(1, Ordering::Relaxed);
        debug!(delivery_tag = tag, "Message published");
        Ok(tag)
    }

    fn messages_published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}
