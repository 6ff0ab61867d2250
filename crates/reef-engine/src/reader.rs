//! Reading and writing shards on named nodes.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use bytes::Bytes;
use reef_store::ShardStore;
use reef_types::ShardDescriptor;
use tracing::debug;

use crate::error::NodeError;

/// Reads one shard's bytes given its descriptor.
///
/// Implementations report every failure as a [`NodeError`]; the fetcher
/// turns those into absent shards and never propagates them.
#[async_trait::async_trait]
pub trait ShardReader: Send + Sync {
    /// Fetch the bytes at `descriptor.path` from `descriptor.node`.
    async fn read_shard(&self, descriptor: &ShardDescriptor) -> Result<Bytes, NodeError>;
}

/// Maps node names to the shard stores that serve them.
///
/// A node missing from the map is unreachable. Nodes can be added and
/// removed at runtime, which is how tests simulate outages.
#[derive(Default)]
pub struct NodeRouter {
    nodes: RwLock<HashMap<String, Arc<dyn ShardStore>>>,
}

impl NodeRouter {
    /// An empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with_node(self, name: impl Into<String>, store: Arc<dyn ShardStore>) -> Self {
        self.insert(name, store);
        self
    }

    /// Register (or replace) the store serving `name`.
    pub fn insert(&self, name: impl Into<String>, store: Arc<dyn ShardStore>) {
        let name = name.into();
        debug!(node = %name, "registered node");
        self.nodes
            .write()
            .expect("lock poisoned")
            .insert(name, store);
    }

    /// Forget a node. Reads addressed to it become unreachable.
    pub fn remove(&self, name: &str) -> Option<Arc<dyn ShardStore>> {
        self.nodes.write().expect("lock poisoned").remove(name)
    }

    /// The store serving `name`, if known.
    pub fn store(&self, name: &str) -> Option<Arc<dyn ShardStore>> {
        self.nodes.read().expect("lock poisoned").get(name).cloned()
    }

    /// Registered node names, sorted.
    pub fn node_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .nodes
            .read()
            .expect("lock poisoned")
            .keys()
            .cloned()
            .collect();
        names.sort();
        names
    }

    /// Store `data` at `path` on `node`.
    pub async fn write_shard(&self, node: &str, path: &str, data: Bytes) -> Result<(), NodeError> {
        let store = self
            .store(node)
            .ok_or_else(|| NodeError::Unreachable(node.to_string()))?;
        store.put(path, data).await?;
        Ok(())
    }

    /// Whether `path` exists on `node`, without reading it.
    ///
    /// An unregistered node holds nothing, so it reports `false`.
    pub async fn has_shard(&self, node: &str, path: &str) -> Result<bool, NodeError> {
        match self.store(node) {
            Some(store) => Ok(store.contains(path).await?),
            None => Ok(false),
        }
    }

    /// Delete `path` on `node`.
    pub async fn delete_shard(&self, node: &str, path: &str) -> Result<(), NodeError> {
        let store = self
            .store(node)
            .ok_or_else(|| NodeError::Unreachable(node.to_string()))?;
        store.delete(path).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl ShardReader for NodeRouter {
    async fn read_shard(&self, descriptor: &ShardDescriptor) -> Result<Bytes, NodeError> {
        let store = self
            .store(&descriptor.node)
            .ok_or_else(|| NodeError::Unreachable(descriptor.node.clone()))?;
        store
            .get(&descriptor.path)
            .await?
            .ok_or_else(|| NodeError::NotFound {
                node: descriptor.node.clone(),
                path: descriptor.path.clone(),
            })
    }
}
