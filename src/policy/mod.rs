//! Eviction policies.
//!
//! A [`Policy`] is a pure function from a snapshot of [`Entry`] records and
//! a capacity to the subset that should be evicted. It never touches disk,
//! never touches the index, and never mutates an entry — the engine is the
//! only thing that acts on a policy's output.
//!
//! All eight variants share one algorithm shape: sort entries by a
//! policy-specific key into "most desirable to keep" order, then walk that
//! order accumulating size; once adding the next entry would exceed
//! `capacity`, that entry and everything after it is a victim. A single
//! entry whose own size exceeds `capacity` is always a victim, since it can
//! never be accumulated without immediately exceeding the limit.
//!
//! | Policy | Sort key | Keep order |
//! |---|---|---|
//! | [`lru::Lru`] | last accessed | newest first |
//! | [`mru::Mru`] | last accessed | oldest first |
//! | [`lfu::Lfu`] | access count | most first |
//! | [`mfu::Mfu`] | access count | fewest first |
//! | [`fifo::Fifo`] | creation time | newest first |
//! | [`lifo::Lifo`] | creation time | oldest first |
//! | [`sliding_ttl::SlidingTtl`] | last accessed | newest first, plus unconditional TTL eviction |
//! | [`fixed_ttl::FixedTtl`] | creation time | newest first, plus unconditional TTL eviction |

pub mod fifo;
pub mod fixed_ttl;
pub mod lfu;
pub mod lifo;
pub mod lru;
pub mod mfu;
pub mod mru;
pub mod sliding_ttl;

pub use fifo::Fifo;
pub use fixed_ttl::FixedTtl;
pub use lfu::Lfu;
pub use lifo::Lifo;
pub use lru::Lru;
pub use mfu::Mfu;
pub use mru::Mru;
pub use sliding_ttl::SlidingTtl;

use std::sync::Arc;

use crate::entry::Entry;
use crate::error::{CacheError, Result};

/// Pure victim-selection function.
///
/// `entries` is an unordered snapshot; `capacity` is the maximum total size
/// in bytes the cache may hold. Implementations must not have side effects
/// and must not read engine or index state beyond what's passed in.
pub trait Policy<K>: Send + Sync {
    /// Returns the subset of `entries` that should be evicted.
    ///
    /// Fails with [`CacheError::InvalidArgument`] if `capacity` is zero.
    fn expired(&self, entries: &[Arc<Entry<K>>], capacity: u64) -> Result<Vec<Arc<Entry<K>>>>;
}

pub(crate) fn require_positive_capacity(capacity: u64) -> Result<()> {
    if capacity == 0 {
        return Err(CacheError::InvalidArgument(
            "capacity must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

/// Walks `desirable_first` (already sorted most-desirable-to-keep-first)
/// accumulating size, and returns every entry from the first one that
/// would push the running total over `capacity` onward — a literal
/// cutoff, not a best-fit scan. Once an entry doesn't fit, everything
/// after it is a victim too, regardless of whether a later, smaller entry
/// would have fit on its own: a less desirable entry must never survive
/// ahead of a more desirable one that didn't.
pub(crate) fn evict_over_capacity<K>(
    desirable_first: Vec<Arc<Entry<K>>>,
    capacity: u64,
) -> Vec<Arc<Entry<K>>> {
    let mut running: u64 = 0;
    let mut iter = desirable_first.into_iter();
    let mut victims = Vec::new();
    for entry in iter.by_ref() {
        let fits = running
            .checked_add(entry.size())
            .map(|total| total <= capacity)
            .unwrap_or(false);
        if fits {
            running += entry.size();
        } else {
            victims.push(entry);
            break;
        }
    }
    victims.extend(iter);
    victims
}


#[cfg(test)]
mod tests {
    use super::test_support::entry;
    use super::*;

    /// Keep-order A(5), B(8), C(1), capacity 10: A fits (running = 5), B
    /// doesn't (5 + 8 = 13 > 10) and is victimized, and C must not slip in
    /// under A's stale running total even though 5 + 1 = 6 <= 10 — once a
    /// more desirable entry is evicted, every less desirable entry after it
    /// is evicted too.
    #[test]
    fn cutoff_victimizes_everything_after_the_first_non_fit_even_if_later_entries_would_fit() {
        let a = entry("a", 5);
        let b = entry("b", 8);
        let c = entry("c", 1);

        let victims = evict_over_capacity(vec![a, b.clone(), c.clone()], 10);

        assert_eq!(victims.len(), 2);
        assert_eq!(*victims[0].key(), "b");
        assert_eq!(*victims[1].key(), "c");
    }

    #[test]
    fn everything_fits_under_capacity() {
        let a = entry("a", 3);
        let b = entry("b", 3);
        assert!(evict_over_capacity(vec![a, b], 10).is_empty());
    }

    #[test]
    fn single_oversized_entry_is_always_a_victim() {
        let a = entry("a", 20);
        let victims = evict_over_capacity(vec![a], 10);
        assert_eq!(victims.len(), 1);
    }
}
