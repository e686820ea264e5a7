//! Error taxonomy for the cache engine.
//!
//! Validation failures (`InvalidArgument`, `RootMissing`) are surfaced
//! directly to the caller. `NotFound` and `Corrupted` describe the state of
//! a specific key at retrieval time. `Io` wraps unexpected filesystem
//! failures that don't fit the other variants (permission errors
//! mid-rename, disk full, and similar). `Cancelled` reports a caller-driven
//! cancellation of an asynchronous call.

use std::io;

use thiserror::Error;

/// Errors returned by [`crate::Cache`] operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A caller-supplied argument was invalid: a null/blank key, an
    /// unreadable stream, a non-positive capacity/poll-interval/TTL, or a
    /// stream whose bytes exceed the configured capacity.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// `get`/`try_get` was called for a key that is not present.
    #[error("key not found")]
    NotFound,

    /// The key was present in the index but its content file was missing
    /// or unreadable at retrieval time.
    #[error("cached content is corrupted or missing on disk")]
    Corrupted,

    /// The configured root directory does not exist at construction time.
    #[error("cache root directory does not exist: {0}")]
    RootMissing(String),

    /// An unexpected filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The caller's cancellation token fired before an asynchronous
    /// operation completed. For `set_async`/`try_set_async` this means the
    /// scratch file has already been deleted and the index is untouched.
    #[error("operation cancelled")]
    Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, CacheError>;
