//! In-memory shard storage backend.

use std::collections::HashMap;
use std::sync::RwLock;

use bytes::Bytes;
use tracing::debug;

use crate::error::StoreError;
use crate::path::validate_path;
use crate::traits::ShardStore;

/// In-memory shard store backed by a `RwLock<HashMap>`.
///
/// Used by tests, benchmarks and nodes configured with the memory backend.
/// Tracks total bytes stored against a configurable maximum.
pub struct MemoryStore {
    shards: RwLock<HashMap<String, Bytes>>,
    max_bytes: u64,
}

impl MemoryStore {
    /// Create a new in-memory store with the given capacity limit.
    pub fn new(max_bytes: u64) -> Self {
        Self {
            shards: RwLock::new(HashMap::new()),
            max_bytes,
        }
    }

    fn used_bytes_unlocked(map: &HashMap<String, Bytes>) -> u64 {
        map.values().map(|v| v.len() as u64).sum()
    }
}

#[async_trait::async_trait]
impl ShardStore for MemoryStore {
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError> {
        validate_path(path)?;
        let mut map = self.shards.write().expect("lock poisoned");
        let used = Self::used_bytes_unlocked(&map);
        let data_len = data.len() as u64;

        // Replacing an existing shard frees its bytes first.
        let existing_len = map.get(path).map_or(0, |v| v.len() as u64);
        let net_increase = data_len.saturating_sub(existing_len);

        if used + net_increase > self.max_bytes {
            return Err(StoreError::CapacityExceeded {
                needed: net_increase,
                available: self.max_bytes.saturating_sub(used),
            });
        }

        debug!(path, size = data.len(), "storing shard in memory");
        map.insert(path.to_string(), data);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Option<Bytes>, StoreError> {
        validate_path(path)?;
        let map = self.shards.read().expect("lock poisoned");
        Ok(map.get(path).cloned())
    }

    async fn delete(&self, path: &str) -> Result<(), StoreError> {
        validate_path(path)?;
        let mut map = self.shards.write().expect("lock poisoned");
        if map.remove(path).is_some() {
            debug!(path, "deleted shard from memory");
        }
        Ok(())
    }

    async fn contains(&self, path: &str) -> Result<bool, StoreError> {
        validate_path(path)?;
        let map = self.shards.read().expect("lock poisoned");
        Ok(map.contains_key(path))
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let map = self.shards.read().expect("lock poisoned");
        Ok(map.keys().cloned().collect())
    }
}
