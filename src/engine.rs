//! The cache engine: streaming ingest, retrieval, clear, dispose, and the
//! background eviction loop.
//!
//! `Cache<K>` is a cheaply-`Clone`-able handle (an `Arc` around shared
//! state) so it can be shared across threads and async tasks. Every
//! operation that touches the byte stream has a blocking twin built on
//! `std::fs`/`std::io` and a non-blocking twin built on `tokio::fs`/
//! `tokio::io`; constructing a `Cache` spawns the background eviction
//! loop via `tokio::spawn`, so it must happen inside a Tokio runtime. The
//! async ingest and retrieval methods take a caller-supplied
//! `CancellationToken`, separate from the token that gates the background
//! loop: cancelling it mid-ingest deletes the scratch file and leaves the
//! index untouched, reported as `CacheError::Cancelled`.

use std::hash::Hash;
use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use sha2::{Digest, Sha256};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::config::CacheConfig;
use crate::entry::Entry;
use crate::error::{CacheError, Result};
use crate::index::Index;
use crate::key::CacheKey;
use crate::observer::{CacheEvent, CacheEventKind, Observer};
use crate::policy::Policy;
use crate::store::ContentStore;

/// 4 KiB, per the ingest algorithm's read buffer size.
const READ_BUFFER_SIZE: usize = 4096;

/// Sleep quantum between `clear` retry passes when some files are locked.
const CLEAR_RETRY_QUANTUM: Duration = Duration::from_millis(100);

struct Shared<K> {
    store: ContentStore,
    index: Index<K>,
    policy: Box<dyn Policy<K>>,
    capacity: u64,
    observer: Box<dyn Observer<K>>,
    cancel: CancellationToken,
    background: StdMutex<Option<tokio::task::JoinHandle<()>>>,
}

/// A disk-backed, content-addressed streaming cache.
///
/// Cheap to `Clone`: cloning shares the same underlying index, store, and
/// background loop.
pub struct Cache<K> {
    shared: std::sync::Arc<Shared<K>>,
}

impl<K> Clone for Cache<K> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

/// Outcome of a successful streaming ingest, before the index is updated.
struct Ingested {
    size: u64,
    path: PathBuf,
}

enum IngestOutcome {
    Done(Ingested),
    OverCapacity,
}

impl<K> Cache<K>
where
    K: CacheKey,
{
    /// Builds a cache from `config`.
    ///
    /// Fails with [`CacheError::RootMissing`] if `config.root_dir` does not
    /// exist. On success, the root is purged of any leftover files or
    /// directories — the cache has no persisted manifest, so an on-disk
    /// layout from a previous run can't be trusted (see the design notes
    /// on durability). Must be called from within a Tokio runtime: it
    /// spawns the background eviction task.
    pub fn new(config: CacheConfig<K>) -> Result<Self> {
        let metadata = std::fs::metadata(&config.root_dir)
            .map_err(|_| CacheError::RootMissing(config.root_dir.display().to_string()))?;
        if !metadata.is_dir() {
            return Err(CacheError::RootMissing(config.root_dir.display().to_string()));
        }

        let store = ContentStore::new(config.root_dir.clone());
        store.purge()?;

        let cancel = CancellationToken::new();
        let shared = std::sync::Arc::new(Shared {
            store,
            index: Index::new(),
            policy: Box::new(ArcPolicy(config.policy)),
            capacity: config.capacity.get(),
            observer: Box::new(ArcObserver(config.observer)),
            cancel: cancel.clone(),
            background: StdMutex::new(None),
        });

        let handle = spawn_eviction_loop(shared.clone(), config.poll_interval, cancel);
        *shared.background.lock().unwrap() = Some(handle);

        Ok(Self { shared })
    }

    fn check_key(&self, key: &K) -> Result<()> {
        if key.is_blank() {
            return Err(CacheError::InvalidArgument("key must not be blank".to_string()));
        }
        Ok(())
    }

    /// Whether `key` is currently present.
    pub fn contains(&self, key: &K) -> Result<bool> {
        self.check_key(key)?;
        Ok(self.shared.index.contains(key))
    }
}

impl<K> Cache<K>
where
    K: CacheKey + Eq + Hash,
{
    /// Opens a read-only handle to the bytes stored under `key`.
    ///
    /// Fails with [`CacheError::NotFound`] if the key is absent, or
    /// [`CacheError::Corrupted`] if the key is indexed but its content file
    /// is missing on disk (indicating external tampering or a lost race
    /// with eviction).
    pub fn get(&self, key: &K) -> Result<std::fs::File> {
        self.check_key(key)?;
        let (entry, path) = self.shared.index.get(key).ok_or(CacheError::NotFound)?;
        let file = std::fs::File::open(&path).map_err(|_| CacheError::Corrupted)?;
        entry.refresh();
        Ok(file)
    }

    /// Async twin of [`Cache::get`]. `cancel` is observed only while
    /// awaiting the file open; once the handle is obtained, `refresh` runs
    /// to completion regardless.
    pub async fn get_async(&self, key: &K, cancel: CancellationToken) -> Result<tokio::fs::File> {
        self.check_key(key)?;
        let (entry, path) = self.shared.index.get(key).ok_or(CacheError::NotFound)?;
        let file = tokio::select! {
            result = tokio::fs::File::open(&path) => result.map_err(|_| CacheError::Corrupted)?,
            _ = cancel.cancelled() => return Err(CacheError::Cancelled),
        };
        entry.refresh();
        Ok(file)
    }

    /// Non-failing twin of [`Cache::get`]: `NotFound` becomes `(false,
    /// None)` instead of an error. `Corrupted` and argument errors still
    /// propagate — absence of a value differs from an invalid call.
    pub fn try_get(&self, key: &K) -> Result<(bool, Option<std::fs::File>)> {
        match self.get(key) {
            Ok(file) => Ok((true, Some(file))),
            Err(CacheError::NotFound) => Ok((false, None)),
            Err(e) => Err(e),
        }
    }

    /// Async twin of [`Cache::try_get`].
    pub async fn try_get_async(
        &self,
        key: &K,
        cancel: CancellationToken,
    ) -> Result<(bool, Option<tokio::fs::File>)> {
        match self.get_async(key, cancel).await {
            Ok(file) => Ok((true, Some(file))),
            Err(CacheError::NotFound) => Ok((false, None)),
            Err(e) => Err(e),
        }
    }

    /// Streams `source` into the cache under `key`.
    ///
    /// Reads in 4 KiB chunks, hashing and writing each chunk before reading
    /// the next, so memory use stays bounded regardless of stream size.
    /// Fails with [`CacheError::InvalidArgument`] if the stream exceeds the
    /// configured capacity — the scratch file is deleted and the index is
    /// left untouched.
    pub fn set<R: Read>(&self, key: K, source: R) -> Result<()> {
        self.check_key(&key)?;
        match self.ingest_sync(source)? {
            IngestOutcome::OverCapacity => Err(CacheError::InvalidArgument(
                "stream exceeds capacity".to_string(),
            )),
            IngestOutcome::Done(ingested) => self.commit_sync(key, ingested),
        }
    }

    /// Async twin of [`Cache::set`].
    ///
    /// If `cancel` fires before ingest finishes, the scratch file is
    /// deleted, the index is left untouched, and this returns
    /// [`CacheError::Cancelled`].
    pub async fn set_async<R: AsyncRead + Unpin>(
        &self,
        key: K,
        source: R,
        cancel: CancellationToken,
    ) -> Result<()> {
        self.check_key(&key)?;
        match self.ingest_async(source, cancel).await? {
            IngestOutcome::OverCapacity => Err(CacheError::InvalidArgument(
                "stream exceeds capacity".to_string(),
            )),
            IngestOutcome::Done(ingested) => self.commit_async(key, ingested).await,
        }
    }

    /// Like [`Cache::set`], but quota overflow is reported as `Ok(false)`
    /// instead of an error.
    pub fn try_set<R: Read>(&self, key: K, source: R) -> Result<bool> {
        self.check_key(&key)?;
        match self.ingest_sync(source)? {
            IngestOutcome::OverCapacity => Ok(false),
            IngestOutcome::Done(ingested) => {
                self.commit_sync(key, ingested)?;
                Ok(true)
            }
        }
    }

    /// Async twin of [`Cache::try_set`].
    pub async fn try_set_async<R: AsyncRead + Unpin>(
        &self,
        key: K,
        source: R,
        cancel: CancellationToken,
    ) -> Result<bool> {
        self.check_key(&key)?;
        match self.ingest_async(source, cancel).await? {
            IngestOutcome::OverCapacity => Ok(false),
            IngestOutcome::Done(ingested) => {
                self.commit_async(key, ingested).await?;
                Ok(true)
            }
        }
    }

    fn ingest_sync<R: Read>(&self, mut source: R) -> Result<IngestOutcome> {
        let scratch = self.shared.store.scratch_path();
        let mut file = std::fs::File::create(&scratch)?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut n: u64 = 0;

        loop {
            let k = source.read(&mut buf)?;
            if k == 0 {
                break;
            }
            hasher.update(&buf[..k]);
            file.write_all(&buf[..k])?;
            n += k as u64;
            if n > self.shared.capacity {
                drop(file);
                let _ = std::fs::remove_file(&scratch);
                return Ok(IngestOutcome::OverCapacity);
            }
        }
        file.flush()?;
        drop(file);

        let digest = hex::encode(hasher.finalize());
        let path = self.shared.store.place(&scratch, &digest)?;
        Ok(IngestOutcome::Done(Ingested { size: n, path }))
    }

    /// On `cancel` firing mid-read, the scratch file is deleted before
    /// returning [`CacheError::Cancelled`]; the index is never touched at
    /// this stage so there's nothing else to unwind.
    async fn ingest_async<R: AsyncRead + Unpin>(
        &self,
        mut source: R,
        cancel: CancellationToken,
    ) -> Result<IngestOutcome> {
        let scratch = self.shared.store.scratch_path();
        let mut file = tokio::fs::File::create(&scratch).await?;
        let mut hasher = Sha256::new();
        let mut buf = [0u8; READ_BUFFER_SIZE];
        let mut n: u64 = 0;

        loop {
            let k = tokio::select! {
                result = source.read(&mut buf) => result?,
                _ = cancel.cancelled() => {
                    drop(file);
                    let _ = tokio::fs::remove_file(&scratch).await;
                    return Err(CacheError::Cancelled);
                }
            };
            if k == 0 {
                break;
            }
            hasher.update(&buf[..k]);
            file.write_all(&buf[..k]).await?;
            n += k as u64;
            if n > self.shared.capacity {
                drop(file);
                let _ = tokio::fs::remove_file(&scratch).await;
                return Ok(IngestOutcome::OverCapacity);
            }
        }
        file.flush().await?;
        drop(file);

        if cancel.is_cancelled() {
            let _ = tokio::fs::remove_file(&scratch).await;
            return Err(CacheError::Cancelled);
        }

        let digest = hex::encode(hasher.finalize());
        let path = self.shared.store.place_async(&scratch, &digest).await?;
        Ok(IngestOutcome::Done(Ingested { size: n, path }))
    }

    /// Upserts `entry` at `path` into the index, returning the event kind
    /// and a superseded path to delete, if any. Shared shape between
    /// sync/async; the index itself is just a lock, so there's nothing
    /// blocking-vs-async to split here.
    fn upsert(&self, key: K, entry: std::sync::Arc<Entry<K>>, path: PathBuf) -> (CacheEventKind, Option<PathBuf>) {
        let prior = self.shared.index.put(key, entry, path.clone());
        match prior {
            None => (CacheEventKind::Added, None),
            Some((_, old_path)) => {
                let superseded = (old_path != path).then_some(old_path);
                (CacheEventKind::Updated, superseded)
            }
        }
    }

    /// A zero-byte input stream fails here exactly like any other
    /// `Entry::new` rejection: `size` must be strictly positive, and a
    /// 0-byte stream produces `ingested.size == 0`. The content file ingest
    /// already placed on disk is deleted before returning, since it would
    /// otherwise be orphaned — unreferenced by any index entry and invisible
    /// to the eviction pass.
    fn commit_sync(&self, key: K, ingested: Ingested) -> Result<()> {
        let entry = match Entry::new(key.clone(), ingested.size) {
            Ok(entry) => std::sync::Arc::new(entry),
            Err(err) => {
                let _ = self.shared.store.delete(&ingested.path);
                return Err(err);
            }
        };
        let (kind, superseded) = self.upsert(key, entry.clone(), ingested.path);
        if let Some(old) = superseded {
            let _ = self.shared.store.delete(&old);
        }
        self.shared.observer.on_event(CacheEvent { kind, entry });
        self.run_eviction_pass()
    }

    /// Async twin of `commit_sync`.
    async fn commit_async(&self, key: K, ingested: Ingested) -> Result<()> {
        let entry = match Entry::new(key.clone(), ingested.size) {
            Ok(entry) => std::sync::Arc::new(entry),
            Err(err) => {
                let _ = self.shared.store.delete_async(&ingested.path).await;
                return Err(err);
            }
        };
        let (kind, superseded) = self.upsert(key, entry.clone(), ingested.path);
        if let Some(old) = superseded {
            let _ = self.shared.store.delete_async(&old).await;
        }
        self.shared.observer.on_event(CacheEvent { kind, entry });
        self.run_eviction_pass_async().await
    }

    fn run_eviction_pass(&self) -> Result<()> {
        let snapshot = self.shared.index.snapshot();
        let victims = self.shared.policy.expired(&snapshot, self.shared.capacity)?;
        trace!(victim_count = victims.len(), "eviction pass");
        for victim in victims {
            if let Some((entry, path)) = self.shared.index.get(victim.key()) {
                if self.shared.store.delete(&path)? {
                    self.shared.index.remove(victim.key());
                    self.shared.observer.on_event(CacheEvent {
                        kind: CacheEventKind::Removed,
                        entry,
                    });
                } else {
                    debug!("victim file locked, retrying next pass");
                }
            }
        }
        Ok(())
    }

    async fn run_eviction_pass_async(&self) -> Result<()> {
        let snapshot = self.shared.index.snapshot();
        let victims = self.shared.policy.expired(&snapshot, self.shared.capacity)?;
        trace!(victim_count = victims.len(), "eviction pass");
        for victim in victims {
            if let Some((entry, path)) = self.shared.index.get(victim.key()) {
                if self.shared.store.delete_async(&path).await? {
                    self.shared.index.remove(victim.key());
                    self.shared.observer.on_event(CacheEvent {
                        kind: CacheEventKind::Removed,
                        entry,
                    });
                } else {
                    debug!("victim file locked, retrying next pass");
                }
            }
        }
        Ok(())
    }

    /// Empties the cache. Retries entries whose files are momentarily
    /// locked until every key is gone, then purges whatever is left on
    /// disk so a fresh ingest starts from a known-empty layout.
    pub fn clear(&self) -> Result<()> {
        while !self.shared.index.is_empty() {
            let keys: Vec<K> = self
                .shared
                .index
                .snapshot()
                .iter()
                .map(|e| e.key().clone())
                .collect();
            let mut any_locked = false;
            for key in keys {
                if let Some((entry, path)) = self.shared.index.get(&key) {
                    if self.shared.store.delete(&path)? {
                        self.shared.index.remove(&key);
                        self.shared.observer.on_event(CacheEvent {
                            kind: CacheEventKind::Removed,
                            entry,
                        });
                    } else {
                        any_locked = true;
                    }
                }
            }
            if any_locked {
                std::thread::sleep(CLEAR_RETRY_QUANTUM);
            }
        }
        self.shared.store.purge()
    }

    /// Async twin of [`Cache::clear`].
    pub async fn clear_async(&self) -> Result<()> {
        while !self.shared.index.is_empty() {
            let keys: Vec<K> = self
                .shared
                .index
                .snapshot()
                .iter()
                .map(|e| e.key().clone())
                .collect();
            let mut any_locked = false;
            for key in keys {
                if let Some((entry, path)) = self.shared.index.get(&key) {
                    if self.shared.store.delete_async(&path).await? {
                        self.shared.index.remove(&key);
                        self.shared.observer.on_event(CacheEvent {
                            kind: CacheEventKind::Removed,
                            entry,
                        });
                    } else {
                        any_locked = true;
                    }
                }
            }
            if any_locked {
                tokio::time::sleep(CLEAR_RETRY_QUANTUM).await;
            }
        }
        self.shared.store.purge()
    }

    /// Cancels the background eviction loop and clears the cache.
    /// Operations on a disposed cache are unspecified.
    pub fn dispose(&self) -> Result<()> {
        self.shared.cancel.cancel();
        self.clear()
    }

    /// Async twin of [`Cache::dispose`]; also awaits the background task's
    /// shutdown instead of firing-and-forgetting the cancellation.
    pub async fn dispose_async(&self) -> Result<()> {
        self.shared.cancel.cancel();
        let handle = self.shared.background.lock().unwrap().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
        self.clear_async().await
    }
}

fn spawn_eviction_loop<K>(
    shared: std::sync::Arc<Shared<K>>,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()>
where
    K: CacheKey + Eq + Hash,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.tick().await; // the first tick fires immediately; a set already triggers a pass
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    let cache = Cache { shared: shared.clone() };
                    if let Err(e) = cache.run_eviction_pass_async().await {
                        warn!(error = %e, "background eviction pass failed");
                    }
                }
            }
        }
    })
}

/// Adapts an `Arc<dyn Policy<K>>` to `Box<dyn Policy<K>>` storage without
/// an extra indirection layer at call time.
struct ArcPolicy<K>(std::sync::Arc<dyn Policy<K>>);

impl<K> Policy<K> for ArcPolicy<K> {
    fn expired(
        &self,
        entries: &[std::sync::Arc<Entry<K>>],
        capacity: u64,
    ) -> Result<Vec<std::sync::Arc<Entry<K>>>> {
        self.0.expired(entries, capacity)
    }
}

struct ArcObserver<K>(std::sync::Arc<dyn Observer<K>>);

impl<K> Observer<K> for ArcObserver<K> {
    fn on_event(&self, event: CacheEvent<K>) {
        self.0.on_event(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::Lru;
    use std::io::Cursor;
    use std::num::NonZeroU64;

    fn config(dir: &tempfile::TempDir, capacity: u64) -> CacheConfig<String> {
        CacheConfig::new(dir.path(), Lru, NonZeroU64::new(capacity).unwrap())
    }

    #[tokio::test]
    async fn round_trip_scenario_1() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 20)).unwrap();

        cache.set("asd".to_string(), Cursor::new(vec![1, 2, 3, 4])).unwrap();
        let mut file = cache.get(&"asd".to_string()).unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn update_scenario_2() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 20)).unwrap();

        cache.set("asd".to_string(), Cursor::new(vec![1, 2, 3, 4])).unwrap();
        cache.set("asd".to_string(), Cursor::new(vec![3, 4, 5, 6])).unwrap();

        let mut file = cache.get(&"asd".to_string()).unwrap();
        let mut out = Vec::new();
        file.read_to_end(&mut out).unwrap();
        assert_eq!(out, vec![3, 4, 5, 6]);
    }

    #[tokio::test]
    async fn quota_overflow_set_scenario_3() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 2)).unwrap();

        let err = cache
            .set("asd".to_string(), Cursor::new(vec![0, 0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
        assert!(!cache.contains(&"asd".to_string()).unwrap());
    }

    #[tokio::test]
    async fn quota_overflow_try_set_scenario_4() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 2)).unwrap();

        let ok = cache
            .try_set("asd".to_string(), Cursor::new(vec![0, 0, 0, 0]))
            .unwrap();
        assert!(!ok);
        assert!(!cache.contains(&"asd".to_string()).unwrap());
    }

    #[tokio::test]
    async fn clear_removes_everything() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 20)).unwrap();
        cache.set("asd".to_string(), Cursor::new(vec![1, 2, 3, 4])).unwrap();

        cache.clear().unwrap();
        assert!(!cache.contains(&"asd".to_string()).unwrap());
    }

    #[tokio::test]
    async fn blank_key_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 20)).unwrap();
        let err = cache.set("".to_string(), Cursor::new(vec![1])).unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn missing_root_is_rejected() {
        let config: CacheConfig<String> =
            CacheConfig::new("/nonexistent/does/not/exist", Lru, NonZeroU64::new(10).unwrap());
        assert!(matches!(Cache::new(config), Err(CacheError::RootMissing(_))));
    }

    #[tokio::test]
    async fn zero_byte_stream_is_rejected_and_leaves_no_trace() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 20)).unwrap();

        let err = cache.set("asd".to_string(), Cursor::new(Vec::new())).unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument(_)));
        assert!(!cache.contains(&"asd".to_string()).unwrap());

        // the ingested (empty) content file must not be left orphaned on disk
        let leftover = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn unreadable_content_file_is_reported_as_corrupted() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 20)).unwrap();
        cache.set("asd".to_string(), Cursor::new(vec![1, 2, 3, 4])).unwrap();

        let digest = hex::encode(Sha256::digest([1u8, 2, 3, 4]));
        let path = dir.path().join(&digest[0..2]).join(&digest[2..4]).join(&digest);
        std::fs::remove_file(&path).unwrap();

        let err = cache.get(&"asd".to_string()).unwrap_err();
        assert!(matches!(err, CacheError::Corrupted));
    }

    struct PendingForever;

    impl tokio::io::AsyncRead for PendingForever {
        fn poll_read(
            self: std::pin::Pin<&mut Self>,
            _cx: &mut std::task::Context<'_>,
            _buf: &mut tokio::io::ReadBuf<'_>,
        ) -> std::task::Poll<std::io::Result<()>> {
            std::task::Poll::Pending
        }
    }

    #[tokio::test]
    async fn cancelling_set_async_mid_ingest_deletes_the_scratch_file() {
        let dir = tempfile::tempdir().unwrap();
        let cache = Cache::new(config(&dir, 20)).unwrap();
        let cancel = CancellationToken::new();

        let cache2 = cache.clone();
        let cancel2 = cancel.clone();
        let handle = tokio::spawn(async move { cache2.set_async("asd".to_string(), PendingForever, cancel2).await });

        tokio::task::yield_now().await;
        cancel.cancel();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(CacheError::Cancelled)));
        assert!(!cache.contains(&"asd".to_string()).unwrap());

        let leftover = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .count();
        assert_eq!(leftover, 0);
    }
}
