//! File-based shard storage backend.
//!
//! Stores one file per shard at `{base_dir}/{path}`; shard paths may contain
//! `/` to group shards in subdirectories.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::path::validate_path;
use crate::traits::ShardStore;

/// Suffix of in-flight temporary files; never listed or read.
const TMP_SUFFIX: &str = ".reef-tmp";

/// File-based shard store.
///
/// Writes are atomic: data is written to a temporary file next to the
/// target, then renamed into place, so a crash never leaves a half-written
/// shard behind.
pub struct FileStore {
    base_dir: PathBuf,
    max_bytes: u64,
    /// Bytes under `base_dir` as of open, adjusted on every put and delete.
    used_bytes: AtomicU64,
}

impl FileStore {
    /// Open a store rooted at `base_dir` with no capacity limit.
    ///
    /// The directory is created if it does not exist.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::with_max_bytes(base_dir, u64::MAX)
    }

    /// Open a store that refuses writes beyond `max_bytes`.
    pub fn with_max_bytes(base_dir: impl AsRef<Path>, max_bytes: u64) -> Result<Self, StoreError> {
        let base_dir = base_dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_dir)?;
        let used = disk_usage(&base_dir)?;
        debug!(base_dir = %base_dir.display(), used, max_bytes, "opened file store");
        Ok(Self {
            base_dir,
            max_bytes,
            used_bytes: AtomicU64::new(used),
        })
    }

    /// Root directory of the store.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Full file path for a shard path.
    fn shard_path(&self, path: &str) -> Result<PathBuf, StoreError> {
        validate_path(path)?;
        Ok(self.base_dir.join(path))
    }

    fn adjust_used(&self, added: u64, removed: u64) {
        self.used_bytes
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |used| {
                Some(used.saturating_add(added).saturating_sub(removed))
            })
            .ok();
    }
}

#[async_trait::async_trait]
impl ShardStore for FileStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        let full = self.shard_path(path)?;

        let existing = match tokio::fs::metadata(&full).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => 0,
            Err(e) => return Err(StoreError::Io(e)),
        };
        let used = self.used_bytes.load(Ordering::Relaxed);
        let net_increase = (data.len() as u64).saturating_sub(existing);
        if used.saturating_add(net_increase) > self.max_bytes {
            return Err(StoreError::CapacityExceeded {
                needed: net_increase,
                available: self.max_bytes.saturating_sub(used),
            });
        }

        if let Some(parent) = full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = full.clone().into_os_string();
        tmp.push(TMP_SUFFIX);
        let tmp = PathBuf::from(tmp);
        tokio::fs::write(&tmp, &data).await?;
        tokio::fs::rename(&tmp, &full).await?;

        self.adjust_used(data.len() as u64, existing);

        debug!(path, file = %full.display(), size = data.len(), "stored shard to file");
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, StoreError> {
        let full = self.shard_path(path)?;
        match tokio::fs::read(&full).await {
            Ok(data) => Ok(Some(Bytes::from(data))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        let full = self.shard_path(path)?;
        let size = match tokio::fs::metadata(&full).await {
            Ok(meta) => meta.len(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(StoreError::Io(e)),
        };
        match tokio::fs::remove_file(&full).await {
            Ok(()) => {
                self.adjust_used(0, size);
                debug!(path, "deleted shard file");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn contains(&self, path: &str) -> Result<bool, StoreError> {
        let full = self.shard_path(path)?;
        match tokio::fs::metadata(&full).await {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut paths = Vec::new();
        let mut pending = vec![self.base_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                    continue;
                }
                if !file_type.is_file() {
                    continue;
                }
                let full = entry.path();
                if let Ok(relative) = full.strip_prefix(&self.base_dir)
                    && let Some(relative) = relative.to_str()
                    && !relative.ends_with(TMP_SUFFIX)
                {
                    paths.push(relative.replace(std::path::MAIN_SEPARATOR, "/"));
                }
            }
        }
        Ok(paths)
    }
}

/// Total size of the regular files below `dir`.
fn disk_usage(dir: &Path) -> Result<u64, StoreError> {
    let mut total = 0;
    let mut pending = vec![dir.to_path_buf()];
    while let Some(dir) = pending.pop() {
        for entry in std::fs::read_dir(&dir)? {
            let entry = entry?;
            let meta = entry.metadata()?;
            if meta.is_dir() {
                pending.push(entry.path());
            } else if meta.is_file() {
                total += meta.len();
            }
        }
    }
    Ok(total)
}
