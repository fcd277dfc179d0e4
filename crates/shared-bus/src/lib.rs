//! # Shared Bus - Queue Change Broker
//!
//! Carries "the queue changed" notifications from whatever mutates the
//! question queue to the gateway's notifier.
//!
//! ## Delivery Semantics
//!
//! - **Ordered:** one queue, one consumer, deliveries arrive in publish order.
//! - **At-least-once:** every delivery must be acknowledged; unacknowledged
//!   deliveries come back (flagged `redelivered`) after a recover.
//! - **Opaque bodies:** the broker moves bytes; [`QueueEvent`] is the JSON
//!   schema producers are expected to publish.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐   recv()   ┌──────────────┐
//! │ Queue writer │ ────────────→ │    Broker    │ ─────────→ │   Notifier   │
//! └──────────────┘               └──────────────┘ ←───────── └──────────────┘
//!                                                    ack()
//! ```

// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod delivery;
pub mod events;
pub mod publisher;
pub mod subscriber;

// Re-export main types
pub use delivery::{AckError, Acknowledger, Delivery};
pub use events::QueueEvent;
pub use publisher::{BrokerError, InMemoryBroker, MessagePublisher};
pub use subscriber::{Consumer, DeliverySource};

/// Maximum deliveries to buffer before publishers wait.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
