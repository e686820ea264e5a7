//! Change notifications.
//!
//! The engine is explicit about what it does *not* own: consuming events
//! for logging or metrics is an external collaborator's job. `Observer` is
//! the seam. Implementations are free to forward events over a channel, a
//! callback slot, or straight into a metrics recorder — the only contract
//! is the ordering guarantee described on [`crate::engine::Cache`].

use std::fmt;
use std::sync::Arc;

use crate::entry::Entry;

/// A snapshot of an entry at the moment an event fired.
///
/// Observers must not assume the key is still present by the time they
/// see this — eviction may have already removed it.
pub struct CacheEvent<K> {
    /// Which lifecycle transition occurred.
    pub kind: CacheEventKind,
    /// The entry as it stood at the moment of the event.
    pub entry: Arc<Entry<K>>,
}

impl<K: fmt::Debug> fmt::Debug for CacheEvent<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheEvent")
            .field("kind", &self.kind)
            .field("key", &self.entry.key())
            .finish()
    }
}

/// The three lifecycle transitions a key can undergo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheEventKind {
    /// A key was set for the first time.
    Added,
    /// A key that was already present was overwritten.
    Updated,
    /// A key was removed — by eviction, `clear`, or being overwritten with
    /// different content (the prior file was superseded).
    Removed,
}

/// Receives lifecycle notifications from a [`crate::engine::Cache`].
///
/// Called synchronously on the thread that triggered the transition; an
/// observer that needs to do expensive work should hand events off to a
/// queue rather than block the caller.
pub trait Observer<K>: Send + Sync {
    /// Called once per lifecycle transition, in linearisation order.
    fn on_event(&self, event: CacheEvent<K>);
}

/// An observer that discards every event. The default when none is
/// configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl<K> Observer<K> for NullObserver {
    fn on_event(&self, _event: CacheEvent<K>) {}
}
