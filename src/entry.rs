//! Cache entry metadata.
//!
//! `Entry<K>` is the unit the [`crate::policy::Policy`] trait reasons about:
//! a key plus the timestamps and access counter eviction policies need.
//! It carries no value and no algorithm-specific metadata slot — the
//! cached bytes live on disk under the content-addressed path tracked
//! separately by [`crate::index::Index`], and all eight policies share the
//! same three fields.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::error::{CacheError, Result};

/// Immutable key/size plus mutable last-access timestamp and access count.
///
/// `creation_time` and `last_accessed` are tracked as nanosecond offsets
/// from an internal monotonic anchor rather than as `Instant` directly, so
/// that `last_accessed` can be updated by [`Entry::refresh`] through a
/// shared reference — readers refresh entries for LRU/LFU bookkeeping
/// without needing exclusive access to the index.
pub struct Entry<K> {
    key: K,
    size: u64,
    anchor: Instant,
    creation_nanos: u64,
    last_accessed_nanos: AtomicU64,
    access_count: AtomicU64,
}

impl<K> Entry<K> {
    /// Creates a new entry for `key` with the given `size` in bytes.
    ///
    /// Fails with [`CacheError::InvalidArgument`] if `size` is zero — every
    /// stored value occupies at least one byte on disk.
    pub fn new(key: K, size: u64) -> Result<Self> {
        if size == 0 {
            return Err(CacheError::InvalidArgument(
                "entry size must be greater than zero".to_string(),
            ));
        }
        let anchor = Instant::now();
        Ok(Self {
            key,
            size,
            anchor,
            creation_nanos: 0,
            last_accessed_nanos: AtomicU64::new(0),
            access_count: AtomicU64::new(0),
        })
    }

    /// The key this entry describes.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Size of the stored content in bytes. Always `> 0`.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Wall-clock instant this entry was created.
    pub fn creation_time(&self) -> Instant {
        self.anchor + Duration::from_nanos(self.creation_nanos)
    }

    /// Wall-clock instant of the most recent successful read or re-set.
    /// Always `>= creation_time()`.
    pub fn last_accessed(&self) -> Instant {
        let nanos = self.last_accessed_nanos.load(Ordering::Acquire);
        self.anchor + Duration::from_nanos(nanos)
    }

    /// Number of successful reads since creation. Monotonically
    /// non-decreasing under concurrent callers.
    pub fn access_count(&self) -> u64 {
        self.access_count.load(Ordering::Acquire)
    }

    /// Atomically increments `access_count` and bumps `last_accessed` to
    /// now. Safe to call from multiple threads concurrently: concurrent
    /// refreshes race only on which timestamp "wins", never on losing an
    /// increment, and the stored timestamp never regresses.
    pub fn refresh(&self) {
        self.access_count.fetch_add(1, Ordering::AcqRel);
        let elapsed = self.anchor.elapsed().as_nanos() as u64;
        self.last_accessed_nanos.fetch_max(elapsed, Ordering::AcqRel);
    }
}

impl<K: Clone> Clone for Entry<K> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            size: self.size,
            anchor: self.anchor,
            creation_nanos: self.creation_nanos,
            last_accessed_nanos: AtomicU64::new(self.last_accessed_nanos.load(Ordering::Acquire)),
            access_count: AtomicU64::new(self.access_count.load(Ordering::Acquire)),
        }
    }
}

impl<K: fmt::Debug> fmt::Debug for Entry<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("size", &self.size)
            .field("access_count", &self.access_count())
            .finish()
    }
}
