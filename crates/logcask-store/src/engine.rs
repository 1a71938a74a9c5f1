//! Storage Engine - Segmented Append-Only Key-Value Store
//!
//! `Store` is the public face of the storage layer: a directory of
//! append-only segment files plus one in-memory hash index mapping each
//! key to the `(segment, offset)` of its authoritative record.
//!
//! ## What Does the Engine Do?
//!
//! 1. **Open/recovery**: scans the directory, replays every segment in
//!    ascending id order (later writes shadow earlier ones) and rebuilds
//!    the index, then opens the newest segment for append
//! 2. **Reads**: look up the index under a shared lock, open the owning
//!    segment read-only, seek, decode a single frame
//! 3. **Writes**: append one frame to the active segment under an
//!    exclusive lock and commit the index entry only after the bytes hit
//!    the file
//! 4. **Rotation**: when the active segment outgrows the configured
//!    ceiling, seal it, start `{prefix}-{id+1}`, and schedule a
//!    background merge of the sealed segments
//!
//! ## Concurrency Model
//!
//! One `tokio::sync::RwLock` guards the writer state (active file handle,
//! segment counter, running offset, index). Reads take it shared, writes
//! and the merger take it exclusive, and the lock is held across file
//! I/O. That is a deliberate trade of availability for simplicity: the
//! engine is correct under any interleaving, and the merge pass simply
//! stalls traffic for its duration.
//!
//! A bounded semaphore caps how many read file descriptors can be open at
//! once; acquisition failure surfaces as `Error::Canceled` before any
//! file is touched.
//!
//! ## Failure Semantics
//!
//! `put` either fully applies (bytes flushed, index updated) or fully
//! fails (index untouched). A write that dies half-way leaves a torn
//! trailing frame; the next `open` of the directory reports it as
//! `CorruptFrame` rather than silently truncating.
//!
//! ## Example
//!
//! ```ignore
//! use logcask_store::{Store, StoreConfig};
//!
//! let store = Store::open("./data", StoreConfig::default()).await?;
//! store.put("user-1", "ada").await?;
//! assert_eq!(store.get("user-1").await?, "ada");
//! store.close().await?;
//! ```

use std::collections::HashMap;
use std::io::SeekFrom;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs::File;
use tokio::io::{AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::sync::{Mutex, RwLock, Semaphore};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use logcask_core::{Entry, Error, Result};

use crate::config::StoreConfig;
use crate::merge;
use crate::segment::{read_value, FrameScanner, Segment};

/// Where a key's authoritative record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RecordLocation {
    pub segment: u32,
    pub offset: u64,
}

/// Mutable engine state, guarded by one readers-writer lock.
#[derive(Debug)]
pub(crate) struct WriterState {
    /// Append handle for the active segment.
    pub out: File,
    /// Id of the active segment.
    pub out_segment: u32,
    /// Byte length of the active segment; the next append lands here.
    pub out_offset: u64,
    /// key -> authoritative record location.
    pub index: HashMap<String, RecordLocation>,
}

#[derive(Debug)]
pub(crate) struct StoreInner {
    pub dir: PathBuf,
    pub config: StoreConfig,
    pub state: RwLock<WriterState>,
    /// Caps simultaneously open read descriptors.
    pub read_slots: Semaphore,
    /// Join handles of in-flight background merges.
    pub merges: Mutex<Vec<JoinHandle<()>>>,
}

/// Handle to an open store. Cheap to clone; all clones share state.
#[derive(Clone, Debug)]
pub struct Store {
    inner: Arc<StoreInner>,
}

/// A point-in-time snapshot of engine counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStatus {
    /// Id of the segment currently accepting appends.
    pub active_segment: u32,
    /// Byte length of the active segment.
    pub active_offset: u64,
    /// Number of live keys in the index.
    pub keys: usize,
}

impl Store {
    /// Open a store over `dir`, creating the directory if needed.
    ///
    /// Replays every segment file in ascending id order to rebuild the
    /// index, then opens the highest-id segment (or `{prefix}-0` for a
    /// fresh directory) for append. Torn trailing bytes in any segment
    /// abort recovery with `CorruptFrame`.
    pub async fn open(dir: impl AsRef<Path>, config: StoreConfig) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&dir).await?;

        let segments = Segment::list(&dir, &config.segment_prefix).await?;
        let active_id = segments.last().map(|segment| segment.id).unwrap_or(0);

        let mut index = HashMap::new();
        let mut active_len = 0u64;
        for segment in &segments {
            let mut scanner = FrameScanner::open(segment).await?;
            let mut offset = 0u64;
            while let Some((entry, len)) = scanner.next_frame().await? {
                index.insert(
                    entry.key,
                    RecordLocation {
                        segment: segment.id,
                        offset,
                    },
                );
                offset += len;
            }
            if segment.id == active_id {
                active_len = offset;
            }
        }

        let active = Segment::new(&dir, &config.segment_prefix, active_id);
        let out = active.open_append().await?;

        info!(
            dir = %dir.display(),
            segment = active_id,
            offset = active_len,
            keys = index.len(),
            "store opened"
        );

        let read_slots = Semaphore::new(config.read_slots);
        Ok(Self {
            inner: Arc::new(StoreInner {
                dir,
                config,
                state: RwLock::new(WriterState {
                    out,
                    out_segment: active_id,
                    out_offset: active_len,
                    index,
                }),
                read_slots,
                merges: Mutex::new(Vec::new()),
            }),
        })
    }

    /// Read the current value for `key`.
    ///
    /// Takes the index lock shared, so reads proceed concurrently with
    /// each other. Each call opens its own read-only descriptor, gated by
    /// the read-slot semaphore.
    pub async fn get(&self, key: &str) -> Result<String> {
        let state = self.inner.state.read().await;
        let location = *state.index.get(key).ok_or(Error::KeyNotFound)?;

        let _slot = self
            .inner
            .read_slots
            .acquire()
            .await
            .map_err(|_| Error::Canceled)?;

        let segment = Segment::new(
            &self.inner.dir,
            &self.inner.config.segment_prefix,
            location.segment,
        );
        debug!(key, segment = location.segment, offset = location.offset, "reading record");
        let mut file = segment.open_read().await?;
        file.seek(SeekFrom::Start(location.offset)).await?;
        let mut reader = BufReader::new(file);
        read_value(&mut reader).await
    }

    /// Write `value` under `key`, shadowing any previous version.
    ///
    /// The previous frame stays on disk until a merge collapses it. The
    /// index is updated only after the append succeeds; a failed write
    /// leaves the index untouched.
    pub async fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.inner.state.write().await;

        let size = state.out.metadata().await?.len();
        if size > self.inner.config.max_segment_bytes {
            self.rotate(&mut state).await?;
        }

        let frame = Entry::new(key, value).encode();
        state.out.write_all(&frame).await?;
        state.out.flush().await?;

        let location = RecordLocation {
            segment: state.out_segment,
            offset: state.out_offset,
        };
        state.index.insert(key.to_string(), location);
        state.out_offset += frame.len() as u64;
        Ok(())
    }

    /// Seal the active segment and start the next one, then schedule a
    /// background merge of the sealed segments. Does not wait for the
    /// merge.
    async fn rotate(&self, state: &mut WriterState) -> Result<()> {
        state.out.flush().await?;
        state.out_segment += 1;
        let segment = Segment::new(
            &self.inner.dir,
            &self.inner.config.segment_prefix,
            state.out_segment,
        );
        state.out = segment.open_append().await?;
        state.out_offset = 0;
        info!(segment = state.out_segment, "rotated to a new active segment");

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            if let Err(err) = merge::merge_segments(&inner).await {
                error!(error = %err, "segment merge failed");
            }
        });
        self.inner.merges.lock().await.push(handle);
        Ok(())
    }

    /// Engine counters; the active segment's on-disk length always equals
    /// `active_offset`.
    pub async fn status(&self) -> StoreStatus {
        let state = self.inner.state.read().await;
        StoreStatus {
            active_segment: state.out_segment,
            active_offset: state.out_offset,
            keys: state.index.len(),
        }
    }

    /// Wait for every scheduled background merge to finish.
    pub async fn wait_for_merges(&self) {
        loop {
            let handles: Vec<JoinHandle<()>> = {
                let mut merges = self.inner.merges.lock().await;
                merges.drain(..).collect()
            };
            if handles.is_empty() {
                break;
            }
            for handle in handles {
                let _ = handle.await;
            }
        }
    }

    /// Wait for in-flight merges, then flush and sync the active segment.
    pub async fn close(&self) -> Result<()> {
        self.wait_for_merges().await;
        let mut state = self.inner.state.write().await;
        state.out.flush().await?;
        state.out.sync_all().await?;
        info!(segment = state.out_segment, keys = state.index.len(), "store closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn open_temp(config: StoreConfig) -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path(), config).await.unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let (_dir, store) = open_temp(StoreConfig::default()).await;
        store.put("k1", "v1").await.unwrap();
        assert_eq!(store.get("k1").await.unwrap(), "v1");
    }

    #[tokio::test]
    async fn test_overwrite_returns_latest() {
        let (_dir, store) = open_temp(StoreConfig::default()).await;
        store.put("k", "first").await.unwrap();
        store.put("k", "second").await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), "second");
    }

    #[tokio::test]
    async fn test_missing_key_is_not_found() {
        let (_dir, store) = open_temp(StoreConfig::default()).await;
        let err = store.get("missing").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fresh_store_creates_segment_zero() {
        let (dir, store) = open_temp(StoreConfig::default()).await;
        store.put("k", "v").await.unwrap();
        assert!(dir.path().join("data-segment-0").exists());
        let status = store.status().await;
        assert_eq!(status.active_segment, 0);
        assert_eq!(status.keys, 1);
    }

    #[tokio::test]
    async fn test_status_offset_tracks_file_length() {
        let (dir, store) = open_temp(StoreConfig::default()).await;
        for i in 0..5 {
            store
                .put(&format!("key-{i}"), &format!("value-{i}"))
                .await
                .unwrap();
            let status = store.status().await;
            let on_disk = std::fs::metadata(dir.path().join("data-segment-0"))
                .unwrap()
                .len();
            assert_eq!(status.active_offset, on_disk);
        }
    }

    #[tokio::test]
    async fn test_concurrent_gets() {
        let (_dir, store) = open_temp(StoreConfig::default()).await;
        for i in 0..50 {
            store.put(&format!("k{i}"), &format!("v{i}")).await.unwrap();
        }

        let mut tasks = Vec::new();
        for i in 0..50 {
            let store = store.clone();
            tasks.push(tokio::spawn(async move {
                store.get(&format!("k{i}")).await.unwrap()
            }));
        }
        for (i, task) in tasks.into_iter().enumerate() {
            assert_eq!(task.await.unwrap(), format!("v{i}"));
        }
    }
}
