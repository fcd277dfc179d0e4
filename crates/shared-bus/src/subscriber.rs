//! # Delivery Consumer
//!
//! Defines the consuming side of the broker.

use crate::delivery::Delivery;
use crate::publisher::AckLedger;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::trace;

/// Anything that yields broker deliveries in order.
///
/// `None` means the broker channel is closed and no more deliveries will
/// arrive.
#[async_trait]
pub trait DeliverySource: Send {
    /// Wait for the next delivery.
    async fn recv(&mut self) -> Option<Delivery>;
}

/// The single consumer of an [`InMemoryBroker`](crate::InMemoryBroker) queue.
///
/// Marks each delivery as received in the broker's ledger, and skips copies
/// of messages that were settled while a redelivery was in flight.
#[derive(Debug)]
pub struct Consumer {
    receiver: mpsc::Receiver<Delivery>,
    ledger: Arc<AckLedger>,
}

impl Consumer {
    pub(crate) fn new(receiver: mpsc::Receiver<Delivery>, ledger: Arc<AckLedger>) -> Self {
        Self { receiver, ledger }
    }

    /// Try to receive the next delivery without waiting.
    ///
    /// Returns `None` both when nothing is buffered and when closed.
    pub fn try_recv(&mut self) -> Option<Delivery> {
        while let Ok(delivery) = self.receiver.try_recv() {
            if self.accept(&delivery) {
                return Some(delivery);
            }
        }
        None
    }

    fn accept(&self, delivery: &Delivery) -> bool {
        let live = self.ledger.mark_delivered(delivery.delivery_tag());
        if !live {
            trace!(delivery_tag = delivery.delivery_tag(), "Skipping settled delivery");
        }
        live
    }
}

#[async_trait]
impl DeliverySource for Consumer {
    async fn recv(&mut self) -> Option<Delivery> {
        while let Some(delivery) = self.receiver.recv().await {
            if self.accept(&delivery) {
                return Some(delivery);
            }
        }
        None
    }
}

#[async_trait]
impl DeliverySource for mpsc::Receiver<Delivery> {
    async fn recv(&mut self) -> Option<Delivery> {
        mpsc::Receiver::recv(self).await
    }
}
