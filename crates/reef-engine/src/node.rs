//! [`ReefNode`]: owns the codec and node router, and runs the object
//! write and read pipelines.

use std::sync::Arc;

use reef_erasure::{ErasureEncoder, ErasureError, PresenceBitmap, ReedSolomon};
use reef_types::{ErasureConfig, ShardDescriptor, ShardManifest};
use tracing::{debug, info, warn};

use crate::engine::ReefEngine;
use crate::error::EngineError;
use crate::fetcher::{FetchConfig, ShardFetcher};
use crate::reader::NodeRouter;
use crate::state::{DecodeState, DecodeTracker};

/// Configuration for creating a [`ReefNode`].
#[derive(Debug, Clone, Default)]
pub struct ReefNodeConfig {
    /// Data and parity shard counts.
    pub erasure: ErasureConfig,
    /// Fetch timeouts.
    pub fetch: FetchConfig,
    /// Nodes shards are written to: shard `i` goes to `nodes[i % nodes.len()]`.
    pub nodes: Vec<String>,
}

/// The node orchestrator.
///
/// The Reed-Solomon codec is built once here and shared read-only by every
/// request.
pub struct ReefNode {
    config: ReefNodeConfig,
    codec: Arc<ReedSolomon>,
    encoder: ErasureEncoder,
    router: Arc<NodeRouter>,
    fetcher: ShardFetcher,
}

impl ReefNode {
    /// Create a node. Fails if the erasure configuration is unusable.
    pub fn new(config: ReefNodeConfig, router: Arc<NodeRouter>) -> Result<Self, EngineError> {
        let codec = Arc::new(ReedSolomon::new(config.erasure)?);
        let encoder = ErasureEncoder::with_codec(codec.clone());
        let fetcher = ShardFetcher::new(router.clone(), config.fetch);
        info!(
            erasure = %config.erasure,
            nodes = config.nodes.len(),
            "reef node ready"
        );
        Ok(Self {
            config,
            codec,
            encoder,
            router,
            fetcher,
        })
    }

    /// The shared codec.
    pub fn codec(&self) -> &Arc<ReedSolomon> {
        &self.codec
    }

    /// The node router.
    pub fn router(&self) -> &Arc<NodeRouter> {
        &self.router
    }

    /// The shard fetcher used by the read path.
    pub fn fetcher(&self) -> &ShardFetcher {
        &self.fetcher
    }

    // ------------------------------------------------------------------
    // Write path
    // ------------------------------------------------------------------

    /// Store an object: frame → encode → write each shard to its node.
    ///
    /// Shard `i` is written to path `"{key}.{i}"` on `nodes[i % nodes.len()]`.
    /// The returned manifest records each shard's size and checksum.
    pub async fn put_object(&self, key: &str, data: &[u8]) -> Result<ShardManifest, EngineError> {
        if self.config.nodes.is_empty() {
            return Err(EngineError::NoNodes);
        }

        info!(key, size = data.len(), "put_object: starting write");

        let encoded = self.encoder.encode(data)?;
        let shard_size = u32::try_from(encoded.shard_set.shard_size)
            .map_err(|_| ErasureError::PayloadTooLarge { len: data.len() })?;

        let mut descriptors = Vec::with_capacity(encoded.shards.len());
        for shard in encoded.shards {
            let node = &self.config.nodes[shard.index % self.config.nodes.len()];
            let path = format!("{key}.{}", shard.index);

            self.router
                .write_shard(node, &path, shard.data)
                .await
                .map_err(|source| EngineError::Write {
                    index: shard.index,
                    source,
                })?;
            debug!(index = shard.index, node, path, "wrote shard");

            descriptors.push(ShardDescriptor {
                path,
                node: node.clone(),
                size: Some(shard_size),
                checksum: Some(shard.checksum),
            });
        }

        info!(
            key,
            shards = descriptors.len(),
            shard_size,
            "put_object: write complete"
        );

        Ok(ShardManifest::new(descriptors))
    }

    // ------------------------------------------------------------------
    // Read path
    // ------------------------------------------------------------------

    /// Recover an object from its manifest: fetch → reconstruct → assemble.
    pub async fn get_object(&self, manifest: &ShardManifest) -> Result<Vec<u8>, EngineError> {
        let mut tracker = DecodeTracker::new();

        let report = match self.fetcher.fetch(manifest, self.config.erasure).await {
            Ok(report) => {
                tracker.transition(DecodeState::Fetched)?;
                report
            }
            Err(e @ EngineError::InsufficientShards { .. }) => {
                tracker.transition(DecodeState::Insufficient)?;
                return Err(e);
            }
            Err(e @ EngineError::Timeout { .. }) => {
                tracker.transition(DecodeState::TimedOut)?;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let corrupt = report.absent().filter(|(_, r)| r.is_corruption()).count();
        let missing: Vec<usize> = report.absent().map(|(i, _)| i).collect();
        debug!(
            present = report.present_count(),
            ?missing,
            corrupt,
            "get_object: shards fetched"
        );

        tracker.transition(DecodeState::Reconstructing)?;
        let shards = report.into_shards();
        match reef_erasure::decode(&self.codec, &shards) {
            Ok(payload) => {
                tracker.transition(DecodeState::Assembled)?;
                info!(
                    size = payload.len(),
                    rebuilt = missing.len(),
                    "get_object: read complete"
                );
                Ok(payload)
            }
            Err(e) => {
                tracker.transition(DecodeState::ReconstructionFailed)?;
                warn!(error = %e, "get_object: reconstruction failed");
                Err(e.into())
            }
        }
    }

    /// Which of a manifest's shards are still stored, without fetching them.
    ///
    /// A lookup that fails marks the shard absent. Sizes and checksums are
    /// not checked; only a read does that.
    pub async fn check_object(
        &self,
        manifest: &ShardManifest,
    ) -> Result<PresenceBitmap, EngineError> {
        manifest.validate(&self.config.erasure)?;

        let mut presence = PresenceBitmap::absent(manifest.len());
        for (index, d) in manifest.descriptors().iter().enumerate() {
            match self.router.has_shard(&d.node, &d.path).await {
                Ok(true) => presence.set_present(index),
                Ok(false) => {}
                Err(e) => warn!(index, node = %d.node, error = %e, "shard lookup failed"),
            }
        }

        debug!(
            present = presence.count_present(),
            absent = presence.count_absent(),
            "check_object: survey complete"
        );
        Ok(presence)
    }
}

#[async_trait::async_trait]
impl ReefEngine for ReefNode {
    async fn put_object(&self, key: &str, data: &[u8]) -> Result<ShardManifest, EngineError> {
        ReefNode::put_object(self, key, data).await
    }

    async fn get_object(&self, manifest: &ShardManifest) -> Result<Vec<u8>, EngineError> {
        ReefNode::get_object(self, manifest).await
    }

    fn erasure_config(&self) -> ErasureConfig {
        self.config.erasure
    }
}
