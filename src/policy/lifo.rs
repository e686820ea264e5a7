//! Last-In-First-Out eviction.

use std::sync::Arc;

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::Result;

/// Evicts the newest entries by creation time, keeping the oldest content
/// resident. Useful when older content is known to be more valuable (e.g.
/// a warmed baseline dataset that should survive churn from newer probes).
///
/// Sort key: [`Entry::creation_time`]. Keep order: oldest first (newest
/// evicted).
#[derive(Debug, Default, Clone, Copy)]
pub struct Lifo;

impl<K: Clone> Policy<K> for Lifo {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let mut sorted = entries.to_vec();
        sorted.sort_by(|a, b| a.creation_time().cmp(&b.creation_time()));
        Ok(evict_over_capacity(sorted, capacity))
    }
}
