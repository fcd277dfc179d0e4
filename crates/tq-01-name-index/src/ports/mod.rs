//! Ports layer for the name index subsystem.
//!
//! Defines the inbound API and the outbound identity store SPI.

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
