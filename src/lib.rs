#![doc = include_str!("../README.md")]

/// Cache entry metadata: key, size, creation time, last access, access
/// count.
pub mod entry;

/// The crate's error and result types.
pub mod error;

/// Change notifications fired on add/update/remove.
pub mod observer;

/// The [`key::CacheKey`] bound satisfied by types usable as cache keys.
pub mod key;

/// Content-addressed on-disk storage.
pub mod store;

/// The in-memory key → (entry, path) index.
pub mod index;

/// Cache construction options.
pub mod config;

/// Eviction policies: [`policy::Lru`], [`policy::Mru`], [`policy::Lfu`],
/// [`policy::Mfu`], [`policy::Fifo`], [`policy::Lifo`],
/// [`policy::SlidingTtl`], [`policy::FixedTtl`].
pub mod policy;

/// The cache engine itself.
pub mod engine;

pub use config::CacheConfig;
pub use engine::Cache;
pub use entry::Entry;
pub use error::{CacheError, Result};
pub use key::CacheKey;
pub use observer::{CacheEvent, CacheEventKind, NullObserver, Observer};
pub use policy::{Fifo, FixedTtl, Lfu, Lifo, Lru, Mfu, Mru, Policy, SlidingTtl};
pub use store::ContentStore;
