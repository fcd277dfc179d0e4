//! # Broker Deliveries
//!
//! A [`Delivery`] is one unit of the at-least-once stream. It must be
//! settled exactly once with [`Delivery::ack`] or [`Delivery::nack`];
//! an unsettled delivery is redelivered after a broker recover.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Errors from settling a delivery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AckError {
    /// The broker has no outstanding delivery with this tag.
    #[error("Unknown delivery tag {0}")]
    UnknownTag(u64),

    /// The channel that produced the delivery is gone.
    #[error("Broker channel closed")]
    ChannelClosed,
}

/// Settles deliveries on behalf of the broker that produced them.
#[async_trait]
pub trait Acknowledger: Send + Sync {
    /// Positive acknowledgment: the delivery is done and will not come back.
    async fn ack(&self, delivery_tag: u64) -> Result<(), AckError>;

    /// Negative acknowledgment. With `requeue`, the delivery stays
    /// outstanding and is redelivered on the next recover.
    async fn nack(&self, delivery_tag: u64, requeue: bool) -> Result<(), AckError>;
}

/// One message received from the broker.
pub struct Delivery {
    delivery_tag: u64,
    redelivered: bool,
    body: Vec<u8>,
    acker: Arc<dyn Acknowledger>,
}

impl Delivery {
    /// Create a delivery settled through `acker`.
    pub fn new(
        delivery_tag: u64,
        redelivered: bool,
        body: Vec<u8>,
        acker: Arc<dyn Acknowledger>,
    ) -> Self {
        Self {
            delivery_tag,
            redelivered,
            body,
            acker,
        }
    }

    /// Broker-assigned tag, unique per outstanding delivery.
    #[must_use]
    pub fn delivery_tag(&self) -> u64 {
        self.delivery_tag
    }

    /// True if this message was delivered before and not acknowledged.
    #[must_use]
    pub fn redelivered(&self) -> bool {
        self.redelivered
    }

    /// Raw message body.
    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Acknowledge and consume the delivery.
    pub async fn ack(self) -> Result<(), AckError> {
        self.acker.ack(self.delivery_tag).await
    }

    /// Reject and consume the delivery.
    pub async fn nack(self, requeue: bool) -> Result<(), AckError> {
        self.acker.nack(self.delivery_tag, requeue).await
    }
}

impl fmt::Debug for Delivery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Delivery")
            .field("delivery_tag", &self.delivery_tag)
            .field("redelivered", &self.redelivered)
            .field("body_len", &self.body.len())
            .finish()
    }
}
