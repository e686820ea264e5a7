//! Least Recently Used eviction.

use std::sync::Arc;

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::Result;

/// Evicts the entries that have gone longest without being accessed.
///
/// Sort key: [`Entry::last_accessed`]. Keep order: newest first.
///
/// ```
/// use streamcache::policy::{Lru, Policy};
/// use streamcache::entry::Entry;
/// use std::sync::Arc;
///
/// let a = Arc::new(Entry::new("a", 5).unwrap());
/// a.refresh();
/// let b = Arc::new(Entry::new("b", 5).unwrap());
/// let victims = Lru.expired(&[a, b], 5).unwrap();
/// assert_eq!(victims.len(), 1);
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Lru;

impl<K: Clone> Policy<K> for Lru {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| b.last_accessed().cmp(&a.last_accessed()));
        Ok(evict_over_capacity(sorted, capacity))
    }
}
