//! Least Frequently Used eviction.

use std::sync::Arc;

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::Result;

/// Evicts the entries with the lowest access count, keeping popular ones.
///
/// Sort key: [`Entry::access_count`]. Keep order: most first.
///
/// ```
/// use streamcache::policy::{Lfu, Policy};
/// use streamcache::entry::Entry;
/// use std::sync::Arc;
///
/// let rare = Arc::new(Entry::new("rare", 5).unwrap());
/// let popular = Arc::new(Entry::new("popular", 5).unwrap());
/// for _ in 0..5 { popular.refresh(); }
///
/// let victims = Lfu.expired(&[rare.clone(), popular], 5).unwrap();
/// assert_eq!(victims.len(), 1);
/// assert_eq!(*victims[0].key(), "rare");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Lfu;

impl<K: Clone> Policy<K> for Lfu {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| b.access_count().cmp(&a.access_count()));
        Ok(evict_over_capacity(sorted, capacity))
    }
}
