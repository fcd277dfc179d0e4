//! Name fragmentation.
//!
//! A person is searchable by every whitespace-separated word of every name
//! they carry, lowercased. "Mary Jane" / "Watson" indexes as `mary`, `jane`
//! and `watson`.

use shared_types::Identity;
use std::collections::BTreeSet;

/// Lowercased words of a single name.
pub fn name_fragments(name: &str) -> impl Iterator<Item = String> + '_ {
    name.split_whitespace().map(str::to_lowercase)
}

/// Distinct fragments across all of an identity's names.
#[must_use]
pub fn identity_fragments(identity: &Identity) -> BTreeSet<String> {
    identity
        .names
        .iter()
        .flat_map(|name| name_fragments(name))
        .collect()
}
