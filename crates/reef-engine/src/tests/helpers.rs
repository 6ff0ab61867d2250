//! Shared test utilities for reef-engine tests.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use reef_store::MemoryStore;
use reef_types::{ErasureConfig, ShardDescriptor, ShardManifest};

use crate::error::NodeError;
use crate::fetcher::FetchConfig;
use crate::node::{ReefNode, ReefNodeConfig};
use crate::reader::{NodeRouter, ShardReader};

pub const TEST_MAX_BYTES: u64 = 1_000_000_000;

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// Node names `node-0 .. node-{n-1}`.
pub fn node_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("node-{i}")).collect()
}

/// A router with `n` in-memory nodes.
pub fn memory_router(n: usize) -> Arc<NodeRouter> {
    let router = NodeRouter::new();
    for name in node_names(n) {
        router.insert(name, Arc::new(MemoryStore::new(TEST_MAX_BYTES)));
    }
    Arc::new(router)
}

/// Fetch settings short enough for tests.
pub fn fast_fetch() -> FetchConfig {
    FetchConfig {
        shard_timeout: Duration::from_millis(200),
        deadline: Duration::from_secs(2),
        early_exit: true,
    }
}

/// A `k + m` node writing round-robin over `nodes` in-memory stores.
pub fn memory_node(k: usize, m: usize, nodes: usize) -> ReefNode {
    ReefNode::new(
        ReefNodeConfig {
            erasure: ErasureConfig::new(k, m),
            fetch: fast_fetch(),
            nodes: node_names(nodes),
        },
        memory_router(nodes),
    )
    .unwrap()
}

/// Delete shard `index` of `manifest` from its node.
pub async fn lose_shard(node: &ReefNode, manifest: &ShardManifest, index: usize) {
    let descriptor = manifest.get(index).unwrap();
    node.router()
        .delete_shard(&descriptor.node, &descriptor.path)
        .await
        .unwrap();
}

/// Overwrite shard `index` of `manifest` with `data`.
pub async fn overwrite_shard(node: &ReefNode, manifest: &ShardManifest, index: usize, data: &[u8]) {
    let descriptor = manifest.get(index).unwrap();
    node.router()
        .write_shard(
            &descriptor.node,
            &descriptor.path,
            Bytes::copy_from_slice(data),
        )
        .await
        .unwrap();
}

/// What a [`ScriptedReader`] does for one path.
#[derive(Clone)]
pub enum Script {
    /// Return these bytes after a delay.
    Reply(Duration, Bytes),
    /// Fail as if the shard were missing.
    Missing,
    /// Never answer.
    Hang,
}

/// A reader whose per-path behavior is fixed up front.
#[derive(Default)]
pub struct ScriptedReader {
    scripts: HashMap<String, Script>,
    calls: AtomicUsize,
}

impl ScriptedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, path: &str, script: Script) -> Self {
        self.scripts.insert(path.to_string(), script);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ShardReader for ScriptedReader {
    async fn read_shard(&self, descriptor: &ShardDescriptor) -> Result<Bytes, NodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.scripts.get(&descriptor.path).cloned() {
            Some(Script::Reply(delay, bytes)) => {
                tokio::time::sleep(delay).await;
                Ok(bytes)
            }
            Some(Script::Hang) => std::future::pending().await,
            Some(Script::Missing) | None => Err(NodeError::NotFound {
                node: descriptor.node.clone(),
                path: descriptor.path.clone(),
            }),
        }
    }
}

/// A manifest of `total` shards at paths `s0 .. s{total-1}` on node `n`.
pub fn scripted_manifest(total: usize) -> ShardManifest {
    ShardManifest::new(
        (0..total)
            .map(|i| ShardDescriptor::new(format!("s{i}"), "n"))
            .collect(),
    )
}
