//! Most Recently Used eviction.

use std::sync::Arc;

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::Result;

/// Evicts the entries that were accessed most recently, keeping stale ones
/// around. Useful for scan-like workloads where recently-touched items are
/// unlikely to be touched again soon.
///
/// Sort key: [`Entry::last_accessed`]. Keep order: oldest first.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mru;

impl<K: Clone> Policy<K> for Mru {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| a.last_accessed().cmp(&b.last_accessed()));
        Ok(evict_over_capacity(sorted, capacity))
    }
}
