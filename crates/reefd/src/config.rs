//! TOML configuration for the Reef daemon.
//!
//! Every section is optional; effective-value accessors fill in defaults
//! (4+2 erasure, 2 s per-shard timeout, 10 s overall deadline).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reef_auth::{AccessKey, MemoryKeyStore};
use reef_engine::FetchConfig;
use reef_types::ErasureConfig;
use serde::Deserialize;

/// Top-level configuration, parsed from TOML.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Data directory and HTTP address.
    pub node: NodeSection,
    /// Shard storage backend and node names.
    pub storage: StorageSection,
    /// Erasure coding parameters.
    pub erasure: ErasureSection,
    /// Shard fetch timeouts.
    pub fetch: FetchSection,
    /// Access keys accepted by the HTTP API.
    pub auth: AuthSection,
    /// Logging configuration.
    pub log: LogSection,
}

/// `[node]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct NodeSection {
    /// Directory holding one shard directory per storage node.
    pub data_dir: PathBuf,
    /// Address for the HTTP API.
    pub listen_addr: String,
}

impl Default for NodeSection {
    fn default() -> Self {
        let data_dir = dirs::home_dir()
            .map(|h| h.join(".reef"))
            .unwrap_or_else(|| PathBuf::from(".reef"));
        Self {
            data_dir,
            listen_addr: "0.0.0.0:4821".to_string(),
        }
    }
}

/// `[storage]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageSection {
    /// Backend type: `"file"` (default) or `"memory"`.
    pub backend: String,
    /// Storage node names. Defaults to one node per shard.
    pub nodes: Vec<String>,
    /// Capacity of each node's store in bytes. Unbounded if omitted.
    pub max_bytes: Option<u64>,
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            nodes: Vec::new(),
            max_bytes: None,
        }
    }
}

/// `[erasure]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErasureSection {
    /// Number of data shards.
    pub data_shards: Option<usize>,
    /// Number of parity shards.
    pub parity_shards: Option<usize>,
}

/// `[fetch]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FetchSection {
    /// Per-shard read timeout in milliseconds.
    pub shard_timeout_ms: Option<u64>,
    /// Overall read deadline in milliseconds.
    pub deadline_ms: Option<u64>,
    /// Stop fetching once enough shards are present.
    pub early_exit: Option<bool>,
}

/// `[auth]` section.
///
/// ```toml
/// [auth.keys.AKEXAMPLE]
/// secret = "..."
/// user_id = "alice"
/// roles = ["writer"]
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AuthSection {
    /// Access key id → key.
    pub keys: BTreeMap<String, AccessKey>,
}

/// `[log]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// Log level filter (e.g. `"info"`, `"debug"`, `"warn"`).
    pub level: String,
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl CliConfig {
    /// Load config from a TOML file, or use defaults if no path given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(p) => {
                let content = std::fs::read_to_string(p)?;
                let config: CliConfig = toml::from_str(&content)?;
                Ok(config)
            }
            None => Ok(Self::default()),
        }
    }

    /// Parse config from a TOML string (used in tests).
    #[cfg(test)]
    pub fn from_toml(s: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(s)?)
    }

    /// Effective erasure configuration.
    pub fn erasure_config(&self) -> ErasureConfig {
        let defaults = ErasureConfig::default();
        ErasureConfig::new(
            self.erasure.data_shards.unwrap_or(defaults.data_shards),
            self.erasure.parity_shards.unwrap_or(defaults.parity_shards),
        )
    }

    /// Effective fetch timeouts.
    pub fn fetch_config(&self) -> FetchConfig {
        let defaults = FetchConfig::default();
        FetchConfig {
            shard_timeout: self
                .fetch
                .shard_timeout_ms
                .map_or(defaults.shard_timeout, Duration::from_millis),
            deadline: self
                .fetch
                .deadline_ms
                .map_or(defaults.deadline, Duration::from_millis),
            early_exit: self.fetch.early_exit.unwrap_or(defaults.early_exit),
        }
    }

    /// Effective storage node names: the configured list, or
    /// `node-0 .. node-{total-1}`.
    pub fn node_names(&self) -> Vec<String> {
        if !self.storage.nodes.is_empty() {
            return self.storage.nodes.clone();
        }
        (0..self.erasure_config().total_shards())
            .map(|i| format!("node-{i}"))
            .collect()
    }

    /// Effective per-node capacity.
    pub fn max_bytes(&self) -> u64 {
        self.storage.max_bytes.unwrap_or(u64::MAX)
    }

    /// Whether shards live in memory only.
    pub fn memory_mode(&self) -> bool {
        self.storage.backend == "memory"
    }

    /// Shard directory of one storage node.
    pub fn node_dir(&self, node: &str) -> PathBuf {
        self.node.data_dir.join("nodes").join(node)
    }

    /// The configured access keys as a lookup table.
    pub fn key_store(&self) -> MemoryKeyStore {
        self.auth
            .keys
            .iter()
            .map(|(id, key)| (id.clone(), key.clone()))
            .collect()
    }
}
