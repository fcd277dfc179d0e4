//! # Name Index Service
//!
//! Keeps the [`PrefixIndex`] in step with the identity lifecycle and answers
//! autocomplete queries.
//!
//! ## Architecture
//!
//! This service implements the inbound port [`NameIndexApi`] and depends on
//! one outbound port:
//! - [`IdentityStore`]: every known identity, read once by [`seed`](NameIndexApi::seed)
//!
//! After seeding, user create/update/delete flows call
//! `index_identity`/`reindex_identity`/`remove_identity` directly; the
//! store is not consulted again. Each of these reports the new entry count
//! to the [`NameIndexObserver`].

use std::sync::Arc;

use async_trait::async_trait;
use shared_types::{Identity, UserId};
use tracing::{debug, info, warn};

use crate::domain::{identity_fragments, NameIndexError, PrefixIndex};
use crate::ports::{IdentityStore, NameIndexApi, NameIndexObserver, NoopIndexObserver};

/// Default autocomplete result count.
pub const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Hard cap on any single autocomplete query.
pub const MAX_SEARCH_LIMIT: usize = 200;

/// Search limits for the name index service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameIndexConfig {
    /// Result count when the caller does not ask for one.
    pub default_limit: usize,
    /// Upper bound applied to caller-supplied limits.
    pub max_limit: usize,
}

impl Default for NameIndexConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: MAX_SEARCH_LIMIT,
        }
    }
}

/// Name index service.
///
/// Cheap to share behind `Arc`; the index carries its own lock.
pub struct NameIndexService<S: IdentityStore> {
    config: NameIndexConfig,
    index: Arc<PrefixIndex>,
    store: Arc<S>,
    observer: Arc<dyn NameIndexObserver>,
}

impl<S: IdentityStore> NameIndexService<S> {
    /// Create a service over an empty index.
    pub fn new(config: NameIndexConfig, store: Arc<S>) -> Self {
        Self::with_index(config, store, Arc::new(PrefixIndex::new()))
    }

    /// Create a service over an existing index.
    pub fn with_index(config: NameIndexConfig, store: Arc<S>, index: Arc<PrefixIndex>) -> Self {
        Self {
            config,
            index,
            store,
            observer: Arc::new(NoopIndexObserver),
        }
    }

    /// Report index size changes to `observer`.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn NameIndexObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The underlying index.
    #[must_use]
    pub fn index(&self) -> &Arc<PrefixIndex> {
        &self.index
    }

    #[must_use]
    pub fn config(&self) -> NameIndexConfig {
        self.config
    }

    /// Number of (fragment, id) pairs indexed.
    #[must_use]
    pub fn entries(&self) -> usize {
        self.index.len()
    }

    fn report_entries(&self) {
        self.observer.entries_changed(self.index.len());
    }
}

#[async_trait]
impl<S: IdentityStore> NameIndexApi for NameIndexService<S> {
    async fn seed(&self) -> Result<usize, NameIndexError> {
        let identities = self.store.load_all_identities().await.map_err(|e| {
            warn!(error = %e, "Failed to load identities for name index");
            NameIndexError::from(e)
        })?;

        let count = identities.len();
        for identity in &identities {
            self.index.add_all(identity_fragments(identity), identity.id);
        }
        self.report_entries();

        info!(
            identities = count,
            entries = self.index.len(),
            "Name index seeded"
        );
        Ok(count)
    }

    fn index_identity(&self, identity: &Identity) {
        self.index.add_all(identity_fragments(identity), identity.id);
        self.report_entries();
        debug!(user_id = identity.id, "Identity indexed");
    }

    fn reindex_identity(&self, old: &Identity, new: &Identity) {
        if old.id != new.id {
            self.index.remove_all(identity_fragments(old), old.id);
            self.index.add_all(identity_fragments(new), new.id);
        } else {
            self.index
                .replace(identity_fragments(old), identity_fragments(new), new.id);
        }
        self.report_entries();
        debug!(user_id = new.id, "Identity re-indexed");
    }

    fn remove_identity(&self, identity: &Identity) {
        self.index
            .remove_all(identity_fragments(identity), identity.id);
        self.report_entries();
        debug!(user_id = identity.id, "Identity removed from index");
    }

    fn search(&self, prefix: &str, max: Option<usize>) -> Vec<UserId> {
        let max = max
            .unwrap_or(self.config.default_limit)
            .min(self.config.max_limit);
        self.index.find(&prefix.trim().to_lowercase(), max)
    }
}
