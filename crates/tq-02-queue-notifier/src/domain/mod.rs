//! Domain layer for the queue notifier subsystem.

pub mod errors;
pub mod payloads;
pub mod registry;

pub use errors::*;
pub use payloads::*;
pub use registry::*;
