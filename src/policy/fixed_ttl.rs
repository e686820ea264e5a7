//! Fixed-TTL eviction: residency-based expiry layered on top of FIFO.

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::{evict_over_capacity, require_positive_capacity, Policy};
use crate::entry::Entry;
use crate::error::{CacheError, Result};

/// Evicts any entry that has resided longer than `τ` unconditionally, then
/// applies FIFO-style capacity eviction to whatever remains.
///
/// Sort key: [`Entry::creation_time`]. Keep order: newest first, except
/// that `now − creation_time > τ` forces eviction regardless of capacity.
#[derive(Debug, Clone, Copy)]
pub struct FixedTtl {
    ttl: Duration,
}

impl FixedTtl {
    /// Creates a fixed-TTL policy with residency window `ttl`.
    ///
    /// Fails with [`CacheError::InvalidArgument`] if `ttl` is zero.
    pub fn new(ttl: Duration) -> Result<Self> {
        if ttl.is_zero() {
            return Err(CacheError::InvalidArgument(
                "fixed TTL must be greater than zero".to_string(),
            ));
        }
        Ok(Self { ttl })
    }
}

impl<K: Clone> Policy<K> for FixedTtl {
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>> {
        require_positive_capacity(capacity)?;
        let now = Instant::now();
        let (mut expired, alive): (Vec<_>, Vec<_>) = entries
            .iter()
            .cloned()
            .partition(|e| now.saturating_duration_since(e.creation_time()) > self.ttl);

        let mut alive = alive;
        alive.sort_by(|a, b| b.creation_time().cmp(&a.creation_time()));
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
        assert!(FixedTtl::new(Duration::ZERO).is_err());
    }

    #[test]
    fn scenario_5_fixed_ttl_expiry() {
        let policy = FixedTtl::new(Duration::from_millis(1)).unwrap();
        let entry = Arc::new(Entry::new("asd", 4).unwrap());
        sleep(Duration::from_millis(100));

        let victims = policy.expired(&[entry.clone()], 20).unwrap();
        assert_eq!(victims.len(), 1);
        assert_eq!(*victims[0].key(), "asd");
    }
}
