//! # Prefix Index
//!
//! Character trie mapping lowercase name fragments to sets of user ids.
//!
//! ## Shape
//!
//! ```text
//!   (root)
//!     └─ 'a'
//!         └─ 'b'
//!             ├─ 'c'  {1, 3}
//!             └─ 'd'  {2}
//! ```
//!
//! Children are kept in a `BTreeMap` and values in a `BTreeSet`, so a
//! depth-first walk yields a node's own ids in ascending order followed by
//! its children in ascending code-point order. Result truncation is
//! therefore deterministic: a larger `max` only ever appends.
//!
//! ## Invariants
//!
//! - A non-root node always holds at least one value or one child.
//! - Nodes are owned by their parent; removal re-walks the path from the
//!   root and prunes on the way back up.

use parking_lot::RwLock;
use shared_types::UserId;
use std::collections::{BTreeMap, BTreeSet};
use std::str::Chars;

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<char, Node>,
    values: BTreeSet<UserId>,
}

impl Node {
    fn is_empty(&self) -> bool {
        self.values.is_empty() && self.children.is_empty()
    }

    fn descend(&self, key: &str) -> Option<&Node> {
        key.chars().try_fold(self, |node, c| node.children.get(&c))
    }

    /// Depth-first collection, own values before children.
    fn collect_into(&self, out: &mut Vec<UserId>, max: usize) {
        for value in &self.values {
            if out.len() >= max {
                return;
            }
            out.push(*value);
        }
        for child in self.children.values() {
            if out.len() >= max {
                return;
            }
            child.collect_into(out, max);
        }
    }

    /// Returns whether `value` was present. Children left empty are pruned.
    fn remove(&mut self, mut key: Chars<'_>, value: UserId) -> bool {
        let Some(c) = key.next() else {
            return self.values.remove(&value);
        };
        let Some(child) = self.children.get_mut(&c) else {
            return false;
        };
        let removed = child.remove(key, value);
        if child.is_empty() {
            self.children.remove(&c);
        }
        removed
    }

    fn node_count(&self) -> usize {
        1 + self.children.values().map(Node::node_count).sum::<usize>()
    }
}

#[derive(Debug, Default)]
struct Inner {
    root: Node,
    entries: usize,
}

impl Inner {
    fn insert(&mut self, key: &str, value: UserId) {
        if key.is_empty() {
            return;
        }
        let node = key
            .chars()
            .fold(&mut self.root, |node, c| node.children.entry(c).or_default());
        if node.values.insert(value) {
            self.entries += 1;
        }
    }

    fn delete(&mut self, key: &str, value: UserId) {
        if key.is_empty() {
            return;
        }
        // The root itself is never pruned.
        if self.root.remove(key.chars(), value) {
            self.entries -= 1;
        }
    }
}

/// Thread-safe prefix index from name fragments to user ids.
///
/// Queries take the read lock and mutations take the write lock, each for
/// the whole operation. The index never logs; callers decide what is worth
/// reporting.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    inner: RwLock<Inner>,
}

impl PrefixIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `value` with `key`.
    ///
    /// Adding an existing pair is a no-op. An empty key is ignored.
    pub fn add(&self, key: &str, value: UserId) {
        self.inner.write().insert(key, value);
    }

    /// Dissociate `value` from `key`, pruning nodes left empty.
    ///
    /// A key whose path does not exist, or a value not stored at it, is a
    /// no-op.
    pub fn remove(&self, key: &str, value: UserId) {
        self.inner.write().delete(key, value);
    }

    /// Associate `value` with every key under a single write lock.
    pub fn add_all<I, S>(&self, keys: I, value: UserId)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.write();
        for key in keys {
            inner.insert(key.as_ref(), value);
        }
    }

    /// Dissociate `value` from every key under a single write lock.
    pub fn remove_all<I, S>(&self, keys: I, value: UserId)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut inner = self.inner.write();
        for key in keys {
            inner.delete(key.as_ref(), value);
        }
    }

    /// Swap the keys `value` is indexed under.
    ///
    /// Readers see either the old key set or the new one, never a mix.
    pub fn replace<I, J, S, T>(&self, old_keys: I, new_keys: J, value: UserId)
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        let mut inner = self.inner.write();
        for key in old_keys {
            inner.delete(key.as_ref(), value);
        }
        for key in new_keys {
            inner.insert(key.as_ref(), value);
        }
    }

    /// Ids stored under `prefix` or any key extending it.
    ///
    /// At most `max` ids are returned: those at the prefix node first in
    /// ascending order, then each child subtree in ascending code-point
    /// order. An id stored under several matching keys appears once per key.
    ///
    /// ## Returns
    ///
    /// Empty when the index is empty, `prefix` is empty, `max` is zero, or
    /// no key starts with `prefix`.
    #[must_use]
    pub fn find(&self, prefix: &str, max: usize) -> Vec<UserId> {
        if prefix.is_empty() || max == 0 {
            return Vec::new();
        }
        let inner = self.inner.read();
        let Some(node) = inner.root.descend(prefix) else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(max.min(inner.entries));
        node.collect_into(&mut out, max);
        out
    }

    /// True if `value` is stored at exactly `key`.
    #[must_use]
    pub fn contains(&self, key: &str, value: UserId) -> bool {
        self.inner
            .read()
            .root
            .descend(key)
            .is_some_and(|node| node.values.contains(&value))
    }

    /// Total number of (key, id) pairs stored.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().entries
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes including the root.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.inner.read().root.node_count()
    }
}
