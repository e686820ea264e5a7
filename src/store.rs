//! Content-addressed on-disk layout.
//!
//! Translates a 256-bit digest into a concrete path, creates the two-level
//! fan-out directories on demand, moves a scratch file into its final
//! location, and deletes files by path. Every operation has a blocking
//! (`std::fs`) and a non-blocking (`tokio::fs`) twin, since
//! [`crate::engine::Cache`] exposes both.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::error::{CacheError, Result};

/// A digest's on-disk home: `root / H[0:2] / H[2:4] / H`.
pub struct ContentStore {
    root: PathBuf,
}

impl ContentStore {
    /// Wraps an existing, writable root directory. Does not create or
    /// validate it — the caller (the engine's constructor) owns that
    /// check, per the contract that directory creation is an external
    /// concern.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// The root directory this store places content under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Derives `root / H[0:2] / H[2:4] / H` for a 64-character lowercase
    /// hex digest.
    ///
    /// Fails with [`CacheError::InvalidArgument`] if `digest` is not
    /// exactly 64 hex characters.
    pub fn content_path(&self, digest: &str) -> Result<PathBuf> {
        if digest.len() != 64 || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(CacheError::InvalidArgument(format!(
                "digest must be 64 lowercase hex characters, got {digest:?}"
            )));
        }
        Ok(self.root.join(&digest[0..2]).join(&digest[2..4]).join(digest))
    }

    /// A fresh, uniquely-named scratch path directly under the root.
    pub fn scratch_path(&self) -> PathBuf {
        self.root.join(Uuid::new_v4().to_string())
    }

    /// Moves `scratch` into its content-addressed location, creating the
    /// fan-out directories if needed. The rename is atomic at the
    /// directory-entry level because `scratch` lives on the same
    /// filesystem as `content_path`.
    pub fn place(&self, scratch: &Path, digest: &str) -> Result<PathBuf> {
        let dest = self.content_path(digest)?;
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(scratch, &dest)?;
        Ok(dest)
    }

    /// Async twin of [`ContentStore::place`].
    pub async fn place_async(&self, scratch: &Path, digest: &str) -> Result<PathBuf> {
        let dest = self.content_path(digest)?;
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(scratch, &dest).await?;
        Ok(dest)
    }

    /// Best-effort delete. Returns `Ok(true)` if the path no longer exists
    /// afterward (including if it was already gone), `Ok(false)` if the
    /// file appears to be locked by another process and deletion should be
    /// retried on a later eviction pass. Unexpected I/O failures still
    /// propagate as [`CacheError::Io`].
    pub fn delete(&self, path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) if is_lock_like(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Async twin of [`ContentStore::delete`].
    pub async fn delete_async(&self, path: &Path) -> Result<bool> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) if is_lock_like(&e) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Removes every file and directory under the root, leaving the root
    /// itself in place. Used by `clear`/`dispose` to reset the layout to a
    /// known-empty state. Entries that fail to delete because they're
    /// locked are left behind silently; a future ingest recreates whatever
    /// directories it needs.
    pub fn purge(&self) -> Result<()> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                let _ = std::fs::remove_dir_all(&path);
            } else {
                let _ = self.delete(&path);
            }
        }
        Ok(())
    }
}

fn is_lock_like(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::PermissionDenied | std::io::ErrorKind::WouldBlock
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_path_requires_64_hex_chars() {
        let store = ContentStore::new(PathBuf::from("/tmp/irrelevant"));
        assert!(store.content_path("abc").is_err());
        assert!(store.content_path(&"g".repeat(64)).is_err());
        assert!(store.content_path(&"a".repeat(64)).is_ok());
    }

    #[test]
    fn content_path_uses_two_level_fanout() {
        let store = ContentStore::new(PathBuf::from("/root"));
        let digest = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd";
        let path = store.content_path(digest).unwrap();
        assert_eq!(path, PathBuf::from("/root/01/23/0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcd"));
    }

    #[test]
    fn place_then_delete_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        let scratch = store.scratch_path();
        std::fs::write(&scratch, b"hello").unwrap();

        let digest = "a".repeat(64);
        let dest = store.place(&scratch, &digest).unwrap();
        assert!(dest.exists());
        assert!(!scratch.exists());

        assert!(store.delete(&dest).unwrap());
        assert!(!dest.exists());
    }

    #[test]
    fn delete_missing_file_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        assert!(store.delete(&dir.path().join("missing")).unwrap());
    }

    #[test]
    fn purge_removes_fanout_but_keeps_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = ContentStore::new(dir.path().to_path_buf());
        let scratch = store.scratch_path();
        std::fs::write(&scratch, b"hello").unwrap();
        store.place(&scratch, &"b".repeat(64)).unwrap();

        store.purge().unwrap();
        assert!(dir.path().exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
