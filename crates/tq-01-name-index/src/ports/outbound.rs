//! # Outbound Ports (Driven Ports)
//!
//! SPIs required by the name index subsystem.

use crate::domain::IdentityStoreError;
use async_trait::async_trait;
use shared_types::Identity;

/// Source of every known identity, read once at startup.
///
/// The store's persistence format is opaque to the index; it only has to
/// produce ids and the names to search them by.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Load all identities.
    async fn load_all_identities(&self) -> Result<Vec<Identity>, IdentityStoreError>;
}

/// Hooks called after the index changes. Defaults to a no-op.
pub trait NameIndexObserver: Send + Sync {
    /// The index now holds `entries` (fragment, id) pairs.
    fn entries_changed(&self, _entries: usize) {}
}

/// Observer that ignores every hook.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopIndexObserver;

impl NameIndexObserver for NoopIndexObserver {}
