//! Cache construction options.
//!
//! Every [`crate::policy::Policy`] has the same shape (`entries, capacity
//! -> victims`), so one `CacheConfig<K>` covers all eight variants — the
//! policy itself is just a trait object, configured (if at all, e.g. a
//! TTL) before being handed in.

use std::num::NonZeroU64;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{CacheError, Result};
use crate::observer::{NullObserver, Observer};
use crate::policy::Policy;

/// Default background eviction period: 1 minute.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Construction-time options for a [`crate::engine::Cache`].
pub struct CacheConfig<K> {
    pub(crate) root_dir: PathBuf,
    pub(crate) policy: Arc<dyn Policy<K>>,
    pub(crate) capacity: NonZeroU64,
    pub(crate) poll_interval: Duration,
    pub(crate) observer: Arc<dyn Observer<K>>,
}

impl<K> CacheConfig<K> {
    /// Starts a config with the required fields: an existing writable
    /// directory, the eviction policy, and the byte capacity. `poll_interval`
    /// defaults to [`DEFAULT_POLL_INTERVAL`] and the observer defaults to
    /// one that discards every event.
    pub fn new(root_dir: impl Into<PathBuf>, policy: impl Policy<K> + 'static, capacity: NonZeroU64) -> Self {
        Self {
            root_dir: root_dir.into(),
            policy: Arc::new(policy),
            capacity,
            poll_interval: DEFAULT_POLL_INTERVAL,
            observer: Arc::new(NullObserver),
        }
    }

    /// Overrides the background eviction period. Must be strictly
    /// positive.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Result<Self> {
        if poll_interval.is_zero() {
            return Err(CacheError::InvalidArgument(
                "poll_interval must be greater than zero".to_string(),
            ));
        }
        self.poll_interval = poll_interval;
        Ok(self)
    }

    /// Registers an observer for `EntryAdded`/`EntryUpdated`/`EntryRemoved`
    /// notifications.
    pub fn with_observer(mut self, observer: impl Observer<K> + 'static) -> Self {
        self.observer = Arc::new(observer);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Lru;

    #[test]
    fn rejects_zero_poll_interval() {
        let config: CacheConfig<&str> =
            CacheConfig::new("/tmp", Lru, NonZeroU64::new(10).unwrap());
        assert!(config.with_poll_interval(Duration::ZERO).is_err());
    }
}
