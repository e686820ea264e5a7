//! Most Frequently Used eviction.

use std::sync::Arc;

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::Result;

/// Evicts the entries with the highest access count, keeping rarely-used
/// ones around. Rarely useful on its own, but occasionally paired with a
/// working set that should be "flushed" once hot.
///
/// Sort key: [`Entry::access_count`]. Keep order: fewest first.
#[derive(Debug, Default, Clone, Copy)]
pub struct Mfu;

impl<K: Clone> Policy<K> for Mfu {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| a.access_count().cmp(&b.access_count()));
        Ok(evict_over_capacity(sorted, capacity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn victim_is_highest_access_count() {
        let rare = Arc::new(Entry::new("rare", 5).unwrap());
        let popular = Arc::new(Entry::new("popular", 5).unwrap());
        for _ in 0..5 {
            popular.refresh();
        }

        let victims = Mfu.expired(&[rare, popular.clone()], 5).unwrap();
        assert_eq!(victims.len(), 1);
        assert_eq!(*victims[0].key(), "popular");
    }
}
