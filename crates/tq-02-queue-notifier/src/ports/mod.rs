//! Ports layer for the queue notifier subsystem.

pub mod outbound;

pub use outbound::*;
