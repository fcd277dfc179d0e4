//! # Inbound Ports (Driving Ports)
//!
//! API exposed by the name index to the identity lifecycle and the
//! autocomplete endpoint.

use crate::domain::NameIndexError;
use async_trait::async_trait;
use shared_types::{Identity, UserId};

/// Primary API of the name index subsystem.
#[async_trait]
pub trait NameIndexApi: Send + Sync {
    /// Load every identity from the identity store and index it.
    ///
    /// ## Returns
    ///
    /// - `Ok(count)`: Number of identities indexed
    /// - `Err(NameIndexError::Seed)`: The identity store failed
    async fn seed(&self) -> Result<usize, NameIndexError>;

    /// Index every name fragment of a newly created identity.
    fn index_identity(&self, identity: &Identity);

    /// Move an identity from its old names to its new ones.
    fn reindex_identity(&self, old: &Identity, new: &Identity);

    /// Drop every name fragment of a deleted identity.
    fn remove_identity(&self, identity: &Identity);

    /// Autocomplete lookup.
    ///
    /// ## Parameters
    ///
    /// - `prefix`: Raw user input; trimmed and lowercased before lookup
    /// - `max`: Result cap, or `None` for the configured default
    fn search(&self, prefix: &str, max: Option<usize>) -> Vec<UserId>;
}
