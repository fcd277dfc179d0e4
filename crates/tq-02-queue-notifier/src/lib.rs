//! # Queue Notifier Subsystem (tq-02)
//!
//! Keeps every connected client's view of the office-hours queue current.
//!
//! ## Architecture Role
//!
//! ```text
//! [Queue writers] ──QueueEvent──→ [Broker] ──Delivery──→ [FanoutNotifier]
//!                                                             │
//!                            current_queue ←── [QueueStore] ──┤
//!                                                             ▼
//!        [WebSocket clients] ←──frames── [ConnectionRegistry] (teacher: full queue,
//!                 │                                           student: own position)
//!                 └──frames──→ read pump ──disconnect──→ deregister
//! ```
//!
//! ## Hexagonal Architecture
//!
//! - **Domain**: [`ConnectionRegistry`], [`RolePayloads`], errors
//! - **Ports**: [`QueueStore`], [`ConnectionTransport`], [`FrameSource`],
//!   [`NotifierObserver`]
//! - **Adapters**: axum WebSocket transport and upgrade handler,
//!   [`InMemoryQueueStore`]
//!
//! ## Locking
//!
//! The registry's mutex doubles as the broadcast lock. A broadcast cycle
//! holds it from the queue fetch through the broker ack, so every
//! connection in a cycle sees the same snapshot and no connection joins or
//! leaves mid-cycle.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod pump;
pub mod service;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export main types
pub use adapters::{InMemoryQueueStore, WsState, WsTransport, DEFAULT_WS_BUFFER};
pub use domain::{
    ConnectionHandle, ConnectionRegistry, QueueStoreError, RegisteredConnection, RolePayloads,
    TransportError,
};
pub use ports::{
    ConnectionTransport, Frame, FrameSource, NoopObserver, NotifierObserver, QueueStore,
};
pub use pump::{run_read_pump, PumpExit};
pub use service::{DeliveryOutcome, FanoutNotifier, NotifierSummary};
