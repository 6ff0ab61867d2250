//! Shared test harness for Reef integration tests.
//!
//! Provides [`IntegrationCluster`]: N named storage nodes behind one
//! [`NodeRouter`], a [`ReefNode`] writing round-robin across them, and
//! failure injection (down nodes, slow nodes, lost or corrupted shards).

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reef_api::{ApiServer, ApiServerConfig};
use reef_auth::{AccessKey, MemoryKeyStore, Policy, TokenVerifier};
use reef_engine::{FetchConfig, NodeRouter, ReefNode, ReefNodeConfig};
use reef_store::{FileStore, MemoryStore, ShardStore, SlowStore};
use reef_types::{ErasureConfig, ShardManifest};

/// Access key provisioned by [`IntegrationCluster::api`].
pub const TEST_ACCESS_KEY: &str = "AKINTEGRATION";
const TEST_SECRET: &str = "integration-secret";

/// Fetch settings short enough for tests that wait on timeouts.
pub fn test_fetch_config() -> FetchConfig {
    FetchConfig {
        shard_timeout: Duration::from_millis(300),
        deadline: Duration::from_secs(3),
        early_exit: true,
    }
}

/// A simulated set of storage nodes and the engine in front of them.
pub struct IntegrationCluster {
    names: Vec<String>,
    stores: Vec<Arc<dyn ShardStore>>,
    router: Arc<NodeRouter>,
    engine: Arc<ReefNode>,
}

impl IntegrationCluster {
    /// `n` in-memory nodes and a `k + m` engine.
    pub fn new(n: usize, k: usize, m: usize) -> Self {
        let stores = (0..n)
            .map(|_| Arc::new(MemoryStore::new(u64::MAX)) as Arc<dyn ShardStore>)
            .collect();
        Self::from_stores(stores, ErasureConfig::new(k, m), test_fetch_config())
    }

    /// `n` file-backed nodes under `dir` and a `k + m` engine.
    pub fn with_file_stores(dir: &Path, n: usize, k: usize, m: usize) -> Self {
        let stores = (0..n)
            .map(|i| {
                let store = FileStore::new(dir.join(format!("node-{i}"))).unwrap();
                Arc::new(store) as Arc<dyn ShardStore>
            })
            .collect();
        Self::from_stores(stores, ErasureConfig::new(k, m), test_fetch_config())
    }

    /// Build a cluster over caller-supplied stores.
    pub fn from_stores(
        stores: Vec<Arc<dyn ShardStore>>,
        erasure: ErasureConfig,
        fetch: FetchConfig,
    ) -> Self {
        let names: Vec<String> = (0..stores.len()).map(|i| format!("node-{i}")).collect();
        let router = Arc::new(NodeRouter::new());
        for (name, store) in names.iter().zip(&stores) {
            router.insert(name.clone(), store.clone());
        }
        let engine = Arc::new(
            ReefNode::new(
                ReefNodeConfig {
                    erasure,
                    fetch,
                    nodes: names.clone(),
                },
                router.clone(),
            )
            .unwrap(),
        );
        Self {
            names,
            stores,
            router,
            engine,
        }
    }

    /// The engine.
    pub fn engine(&self) -> &Arc<ReefNode> {
        &self.engine
    }

    /// The node router shared with the engine.
    pub fn router(&self) -> &Arc<NodeRouter> {
        &self.router
    }

    /// Name of node `i`.
    pub fn name(&self, i: usize) -> &str {
        &self.names[i]
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns `true` if the cluster has no nodes.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Take node `i` off the router: its shards become unreachable.
    pub fn kill_node(&self, i: usize) {
        self.router.remove(&self.names[i]);
    }

    /// Put node `i`'s original store back.
    pub fn revive_node(&self, i: usize) {
        self.router
            .insert(self.names[i].clone(), self.stores[i].clone());
    }

    /// Make every read from node `i` take `latency`.
    pub fn slow_node(&self, i: usize, latency: Duration) {
        let ms = latency.as_millis() as u64;
        let slow = SlowStore::new(self.stores[i].clone())
            .read_latency(ms, ms)
            .seed(i as u64);
        self.router.insert(self.names[i].clone(), Arc::new(slow));
    }

    /// Shards currently stored on node `i`.
    pub async fn shard_count(&self, i: usize) -> usize {
        self.stores[i].list().await.unwrap().len()
    }

    /// Delete shard `index` of `manifest` from its node.
    pub async fn lose_shard(&self, manifest: &ShardManifest, index: usize) {
        let d = manifest.get(index).unwrap();
        self.router.delete_shard(&d.node, &d.path).await.unwrap();
    }

    /// Flip one byte of shard `index` of `manifest` in place.
    pub async fn corrupt_shard(&self, manifest: &ShardManifest, index: usize) {
        let d = manifest.get(index).unwrap();
        let store = self.router.store(&d.node).unwrap();
        let mut data = store.get(&d.path).await.unwrap().unwrap().to_vec();
        data[0] ^= 0xFF;
        store.put(&d.path, Bytes::from(data)).await.unwrap();
    }

    /// An HTTP router over this cluster's engine plus a valid bearer token.
    pub fn api(&self) -> (axum::Router, String) {
        let keys = MemoryKeyStore::new().with_key(
            TEST_ACCESS_KEY,
            AccessKey {
                secret: TEST_SECRET.to_string(),
                user_id: "integration".to_string(),
                roles: vec!["writer".to_string()],
            },
        );
        let server = ApiServer::new(ApiServerConfig::new(
            self.engine.clone(),
            TokenVerifier::new(Arc::new(keys)),
        ));
        let policy = Policy::expires_in(reef_auth::unix_now(), Duration::from_secs(600));
        let bearer = reef_auth::sign(TEST_ACCESS_KEY, TEST_SECRET, &policy).unwrap();
        (server.into_router(), bearer)
    }
}

/// Generate deterministic test data with a custom seed.
pub fn test_data_seeded(size: usize, seed: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = seed;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Generate deterministic test data.
pub fn test_data(size: usize) -> Vec<u8> {
    test_data_seeded(size, 0xDEAD_BEEF)
}
