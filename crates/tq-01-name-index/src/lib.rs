//! # Name Index Subsystem (tq-01)
//!
//! Prefix index over user names, used for username and name autocomplete.
//!
//! ## Architecture Role
//!
//! ```text
//! [Identity Store] ──load_all_identities──→ [Name Index] ←──search── [Autocomplete]
//!                                               ↑
//!                 user create/update/delete ────┘
//! ```
//!
//! Every whitespace-separated word of a user's username, first name and last
//! name is lowercased and stored against the user's numeric id. A search
//! returns ids whose fragments start with the query.
//!
//! ## Hexagonal Architecture
//!
//! - **Domain**: [`PrefixIndex`] trie and name fragmentation (pure, sync)
//! - **Ports**: [`NameIndexApi`] (inbound), [`IdentityStore`] (outbound)
//! - **Adapters**: [`InMemoryIdentityStore`]
//!
//! ## Ordering
//!
//! Results are deterministic. For the entries `("abc", 1)`, `("abd", 2)` and
//! `("abc", 3)`, searching `"ab"` yields `[1, 3, 2]`: ids at a node in
//! ascending order, then child subtrees in ascending code-point order.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

// Re-export main types
pub use adapters::InMemoryIdentityStore;
pub use domain::{
    identity_fragments, name_fragments, IdentityStoreError, NameIndexError, PrefixIndex,
};
pub use ports::{IdentityStore, NameIndexApi, NameIndexObserver, NoopIndexObserver};
pub use service::{NameIndexConfig, NameIndexService, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
