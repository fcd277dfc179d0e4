//! Domain layer for the name index subsystem.

pub mod errors;
pub mod fragments;
pub mod trie;

pub use errors::*;
pub use fragments::*;
pub use trie::*;
