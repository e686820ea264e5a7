//! Sliding-TTL eviction: inactivity-based expiry layered on top of LRU.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::{CacheError, Result};

/// Evicts any entry idle for longer than `τ` unconditionally, then applies
/// LRU-style capacity eviction to whatever remains.
///
/// Sort key: [`Entry::last_accessed`]. Keep order: newest first, except
/// that `now − last_accessed > τ` forces eviction regardless of capacity.
#[derive(Debug, Clone, Copy)]
pub struct SlidingTtl {
    ttl: Duration,
}

impl SlidingTtl {
    /// Creates a sliding-TTL policy with inactivity window `ttl`.
    ///
    /// Fails with [`CacheError::InvalidArgument`] if `ttl` is zero.
    pub fn new(ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidArgument(
                "sliding TTL must be greater than zero".to_string(),
            ));
        }
        Ok(Self { ttl })
    }
}

impl<K: Clone> Policy<K> for SlidingTtl {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let now = Instant::now();
        let (mut expired, alive): (Vec<_>, Vec<_>) = entries
            .iter()
            .cloned()
            .partition(|e| now.saturating_duration_since(e.last_accessed()) > self.ttl);

        let mut alive = alive;
        alive.sort_by(|a, b| b.last_accessed().cmp(&a.last_accessed()));
        expired.extend(evict_over_capacity(alive, capacity));
        Ok(expired)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread::sleep;

    #[test]
    fn rejects_zero_ttl() {
        assert!(SlidingTtl::new(Duration::ZERO).is_err());
    }

    #[test]
    fn idle_entry_is_expired_regardless_of_capacity() {
        let policy = SlidingTtl::new(Duration::from_millis(1)).unwrap();
        let entry = Arc::new(Entry::new("asd", 4).unwrap());
        sleep(Duration::from_millis(20));

        let victims = policy.expired(&[entry.clone()], 20).unwrap();
        assert_eq!(victims.len(), 1);
        assert_eq!(*victims[0].key(), "asd");
    }

    #[test]
    fn recently_accessed_entry_survives() {
        let policy = SlidingTtl::new(Duration::from_secs(60)).unwrap();
        let entry = Arc::new(Entry::new("asd", 4).unwrap());

        let victims = policy.expired(&[entry], 20).unwrap();
        assert!(victims.is_empty());
    }
}
