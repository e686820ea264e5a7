//! Key validation.
//!
//! A null or blank key is rejected with `InvalidArgument`. Rust's type
//! system already rules out passing `null` for a generic `K`, so the only
//! meaningful check left is "blank" — which only makes sense for
//! string-shaped keys. `CacheKey` is a marker trait with a default that
//! never rejects anything; string-like key types override it.

use std::hash::Hash;

/// Bound satisfied by any type usable as a [`crate::engine::Cache`] key.
pub trait CacheKey: Eq + Hash + Clone + Send + Sync + 'static {
    /// Whether this key should be rejected as null/blank. Defaults to
    /// `false` — only string-shaped keys have a meaningful notion of
    /// "blank".
    fn is_blank(&self) -> bool {
        false
    }
}

impl CacheKey for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl CacheKey for &'static str {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl CacheKey for std::sync::Arc<str> {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl CacheKey for u64 {}
impl CacheKey for u32 {}
impl CacheKey for i64 {}
impl CacheKey for i32 {}
impl CacheKey for uuid::Uuid {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_strings_are_rejected() {
        assert!("".is_blank());
        assert!("   ".is_blank());
        assert!(!"asd".is_blank());
    }

    #[test]
    fn non_string_keys_are_never_blank() {
        assert!(!42u64.is_blank());
    }
}
