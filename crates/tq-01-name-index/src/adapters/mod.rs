//! Adapters layer for the name index subsystem.

pub mod memory;

pub use memory::InMemoryIdentityStore;
