//! In-memory identity store.
//!
//! Backs the gateway when no external user database is wired in. Can be
//! seeded from a JSON array of `{"id": 1, "names": ["jdoe", "John", "Doe"]}`.

use crate::domain::IdentityStoreError;
use crate::ports::IdentityStore;
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::{Identity, UserId};
use std::collections::BTreeMap;
use std::path::Path;

/// Identity store held in a map, ordered by id.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    identities: RwLock<BTreeMap<UserId, Identity>>,
}

impl InMemoryIdentityStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding `identities`. Later duplicates of an id win.
    pub fn with_identities(identities: impl IntoIterator<Item = Identity>) -> Self {
        let store = Self::new();
        for identity in identities {
            store.upsert(identity);
        }
        store
    }

    /// Parse a JSON array of identities.
    pub fn from_json_str(json: &str) -> Result<Self, IdentityStoreError> {
        let identities: Vec<Identity> =
            serde_json::from_str(json).map_err(|e| IdentityStoreError::Decode(e.to_string()))?;
        Ok(Self::with_identities(identities))
    }

    /// Read and parse a JSON identities file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, IdentityStoreError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            IdentityStoreError::Unavailable(format!("{}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    /// Insert or replace an identity, returning the previous one.
    pub fn upsert(&self, identity: Identity) -> Option<Identity> {
        self.identities.write().insert(identity.id, identity)
    }

    /// Remove an identity by id.
    pub fn remove(&self, id: UserId) -> Option<Identity> {
        self.identities.write().remove(&id)
    }

    #[must_use]
    pub fn get(&self, id: UserId) -> Option<Identity> {
        self.identities.read().get(&id).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.identities.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.identities.read().is_empty()
    }
}

#[async_trait]
impl IdentityStore for InMemoryIdentityStore {
    async fn load_all_identities(&self) -> Result<Vec<Identity>, IdentityStoreError> {
        Ok(self.identities.read().values().cloned().collect())
    }
}
