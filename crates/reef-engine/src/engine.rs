//! [`ReefEngine`]: the data-plane trait for protocol adapters.
//!
//! The HTTP API depends on this trait instead of the concrete
//! [`ReefNode`](crate::ReefNode), so tests can swap in other engines.

use reef_types::{ErasureConfig, ShardManifest};

use crate::error::EngineError;

/// The data-plane interface exposed to protocol adapters.
#[async_trait::async_trait]
pub trait ReefEngine: Send + Sync {
    /// Encode `data`, store its shards under `key`, and return the manifest.
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<ShardManifest, EngineError>;

    /// Recover the payload described by `manifest`.
    async fn get_object(&self, manifest: &ShardManifest) -> Result<Vec<u8>, EngineError>;

    /// The redundancy configuration objects are encoded with.
    fn erasure_config(&self) -> ErasureConfig;
}
