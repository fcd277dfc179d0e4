//! # Domain Errors
//!
//! Error types for the name index subsystem.

use thiserror::Error;

/// Errors raised by an identity store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityStoreError {
    /// The store could not be reached or read.
    #[error("Identity store unavailable: {0}")]
    Unavailable(String),

    /// Stored identity data could not be decoded.
    #[error("Identity decode error: {0}")]
    Decode(String),
}

/// Errors surfaced by the name index service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameIndexError {
    /// Loading identities for seeding failed.
    #[error("Seeding failed: {0}")]
    Seed(#[from] IdentityStoreError),
}
