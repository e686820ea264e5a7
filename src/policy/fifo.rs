//! First-In-First-Out eviction.

use std::sync::Arc;

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::Result;

/// Evicts the oldest entries by creation time, ignoring access patterns
/// entirely.
///
/// Sort key: [`Entry::creation_time`]. Keep order: newest first (oldest
/// evicted).
///
/// ```
/// use streamcache::policy::{Fifo, Policy};
/// use streamcache::entry::Entry;
/// use std::sync::Arc;
/// use std::thread::sleep;
/// use std::time::Duration;
///
/// let first = Arc::new(Entry::new("first", 5).unwrap());
/// sleep(Duration::from_millis(2));
/// let second = Arc::new(Entry::new("second", 5).unwrap());
///
/// let victims = Fifo.expired(&[first.clone(), second], 5).unwrap();
/// assert_eq!(*victims[0].key(), "first");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Fifo;

impl<K: Clone> Policy<K> for Fifo {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| b.creation_time().cmp(&a.creation_time()));
        Ok(evict_over_capacity(sorted, capacity))
    }
}
