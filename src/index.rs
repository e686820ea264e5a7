//! The authoritative in-memory map of currently-cached keys.
//!
//! The on-disk layout is never scanned at query time — every presence
//! check and path lookup goes through this structure. Internally it keeps
//! one map, not the two logically-parallel mappings the design describes,
//! because a single [`parking_lot::RwLock`] guarding one `HashMap` makes
//! the "entry and path mutated as one logical unit" invariant trivial: a
//! reader can never observe one half of a `put` without the other. Two
//! separate maps behind one lock would buy nothing.
//!
//! Custom key equality (a `key_equality` configuration option) is not implemented
//! as a runtime-pluggable relation: `HashMap` requires `Hash` to agree with
//! `Eq`, so a type-erased comparator can't be threaded through safely.
//! Callers that need non-default equality define a key newtype with their
//! own `Eq`/`Hash` impls instead — the idiomatic Rust answer to the same
//! problem.

use std::collections::HashMap;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::entry::Entry;

struct Slot<K> {
    entry: Arc<Entry<K>>,
    path: PathBuf,
}

/// Concurrent key → (entry, content path) map.
pub struct Index<K> {
    slots: RwLock<HashMap<K, Slot<K>>>,
}

impl<K> Default for Index<K>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Index<K>
where
    K: Eq + Hash,
{
    /// An empty index.
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Whether `key` is currently present.
    pub fn contains(&self, key: &K) -> bool {
        self.slots.read().contains_key(key)
    }

    /// The entry and content path for `key`, if present.
    pub fn get(&self, key: &K) -> Option<(Arc<Entry<K>>, PathBuf)> {
        self.slots
            .read()
            .get(key)
            .map(|slot| (slot.entry.clone(), slot.path.clone()))
    }

    /// Upserts `key`. Returns the prior `(entry, path)` if one existed, so
    /// the engine can tell "add" from "update" and delete a superseded
    /// file.
    pub fn put(
        &self,
        key: K,
        entry: Arc<Entry<K>>,
        path: PathBuf,
    ) -> Option<(Arc<Entry<K>>, PathBuf)> {
        self.slots
            .write()
            .insert(key, Slot { entry, path })
            .map(|slot| (slot.entry, slot.path))
    }

    /// Removes `key`, returning its prior `(entry, path)` if present.
    pub fn remove(&self, key: &K) -> Option<(Arc<Entry<K>>, PathBuf)> {
        self.slots
            .write()
            .remove(key)
            .map(|slot| (slot.entry, slot.path))
    }

    /// A point-in-time copy of every indexed entry, for feeding to a
    /// [`crate::policy::Policy`].
    pub fn snapshot(&self) -> Vec<Arc<Entry<K>>> {
        self.slots.read().values().map(|s| s.entry.clone()).collect()
    }

    /// Empties both mappings.
    pub fn clear_all(&self) {
        self.slots.write().clear();
    }

    /// Number of currently-indexed keys.
    pub fn len(&self) -> usize {
        self.slots.read().len()
    }

    /// Whether the index currently holds no keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &'static str) -> Arc<Entry<&'static str>> {
        Arc::new(Entry::new(key, 4).unwrap())
    }

    #[test]
    fn put_then_get_round_trips() {
        let index = Index::new();
        index.put("k", entry("k"), PathBuf::from("/p"));
        assert!(index.contains(&"k"));
        let (e, p) = index.get(&"k").unwrap();
        assert_eq!(*e.key(), "k");
        assert_eq!(p, PathBuf::from("/p"));
    }

    #[test]
    fn put_returns_prior_on_overwrite() {
        let index = Index::new();
        assert!(index.put("k", entry("k"), PathBuf::from("/p1")).is_none());
        let prior = index.put("k", entry("k"), PathBuf::from("/p2"));
        assert_eq!(prior.unwrap().1, PathBuf::from("/p1"));
    }

    #[test]
    fn remove_and_clear() {
        let index = Index::new();
        index.put("k", entry("k"), PathBuf::from("/p"));
        assert!(index.remove(&"k").is_some());
        assert!(!index.contains(&"k"));

        index.put("a", entry("a"), PathBuf::from("/a"));
        index.put("b", entry("b"), PathBuf::from("/b"));
        index.clear_all();
        assert!(index.is_empty());
    }

    #[test]
    fn snapshot_reflects_current_state() {
        let index = Index::new();
        index.put("a", entry("a"), PathBuf::from("/a"));
        index.put("b", entry("b"), PathBuf::from("/b"));
        assert_eq!(index.snapshot().len(), 2);
    }
}
