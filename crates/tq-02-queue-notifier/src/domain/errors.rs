//! # Domain Errors
//!
//! Error types for the queue notifier subsystem.

use thiserror::Error;

/// Errors raised by the queue store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueueStoreError {
    /// No queue has ever been written. Callers treat this as an empty queue.
    #[error("Queue not found")]
    NotFound,

    /// The store could not be reached.
    #[error("Queue store unavailable: {0}")]
    Unavailable(String),

    /// The stored queue could not be decoded.
    #[error("Queue decode error: {0}")]
    Decode(String),
}

/// Errors raised by a connection transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The connection is closed.
    #[error("Connection closed")]
    Closed,

    /// The outbound buffer is full; the peer is not keeping up.
    #[error("Outbound buffer full")]
    Backpressure,

    /// Underlying I/O failure.
    #[error("Transport I/O error: {0}")]
    Io(String),
}
