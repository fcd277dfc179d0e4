//! # Outbound Ports (Driven Ports)
//!
//! SPIs required by the queue notifier.
//!
//! - [`QueueStore`]: current queue snapshot (may block)
//! - [`ConnectionTransport`]: non-blocking write side of a client connection
//! - [`FrameSource`]: read side of a client connection, drained by the read pump
//! - [`NotifierObserver`]: lifecycle hooks for metrics

use crate::domain::{QueueStoreError, TransportError};
use async_trait::async_trait;
use shared_types::QuestionQueue;

/// Read access to the current question queue.
#[async_trait]
pub trait QueueStore: Send + Sync {
    /// Fetch the current queue.
    ///
    /// ## Returns
    ///
    /// - `Ok(queue)`: The queue, front of the line first
    /// - `Err(QueueStoreError::NotFound)`: No queue was ever written
    /// - `Err(_)`: The store failed
    async fn current_queue(&self) -> Result<QuestionQueue, QueueStoreError>;
}

/// Write side of a live client connection.
///
/// Both methods must return without waiting on the peer; a transport that
/// cannot accept a frame immediately fails the write instead.
pub trait ConnectionTransport: Send + Sync {
    /// Queue one text frame for the peer.
    fn write_text(&self, text: &str) -> Result<(), TransportError>;

    /// Close the connection. Idempotent.
    fn close(&self);
}

/// A frame received from a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    Binary(Vec<u8>),
    Ping(Vec<u8>),
    Pong(Vec<u8>),
    /// The peer asked to close.
    Close,
}

/// Read side of a live client connection.
#[async_trait]
pub trait FrameSource: Send {
    /// Wait for the next frame.
    ///
    /// `Err(TransportError::Closed)` signals the end of the stream.
    async fn read_next(&mut self) -> Result<Frame, TransportError>;
}

/// Hooks called by the notifier and the read pump. All default to no-ops.
pub trait NotifierObserver: Send + Sync {
    /// A broadcast cycle finished.
    fn broadcast_completed(&self, _delivered: usize, _pruned: usize) {}

    /// A delivery was acknowledged without being broadcast.
    fn delivery_dropped(&self) {}

    /// The number of registered connections changed.
    fn connections_changed(&self, _active: usize) {}
}

/// Observer that ignores every hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl NotifierObserver for NoopObserver {}
