//! # Shared Types Crate
//!
//! This crate contains the entities shared by the name index, the queue
//! notifier and the gateway runtime.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: All cross-subsystem types are defined here.
//! - **Typed Payloads**: Frames sent to clients are a tagged [`Payload`] enum,
//!   never an untyped JSON value.
//! - **Opaque Students**: The queue only knows a student by the string id
//!   carried on each question; the same id keys their WebSocket connection.

pub mod entities;
pub mod errors;
pub mod payload;

pub use entities::*;
pub use errors::*;
pub use payload::Payload;
