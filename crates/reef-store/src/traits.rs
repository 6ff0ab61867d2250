//! Core trait and types for shard storage.

use bytes::Bytes;

use crate::error::StoreError;

/// Trait for storing and retrieving shard bytes by relative path.
///
/// All implementations must be `Send + Sync` for use across async tasks.
/// Data is passed as [`Bytes`] so shards move through the read and write
/// paths without copies.
#[async_trait::async_trait]
pub trait ShardStore: Send + Sync {
    /// Store a shard under `path`, replacing anything already there.
    async fn put(&self, path: &str, data: Bytes) -> Result<(), StoreError>;

    /// Retrieve a shard. Returns `None` if nothing is stored at `path`.
    async fn get(&self, path: &str) -> Result<Option<Bytes>, StoreError>;

    /// Delete a shard. Deleting a missing path is not an error.
    async fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Check whether a shard exists.
    async fn contains(&self, path: &str) -> Result<bool, StoreError>;

    /// List every stored path.
    async fn list(&self) -> Result<Vec<String>, StoreError>;
}
