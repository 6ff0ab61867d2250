//! Shard manifests: where each shard of an object lives.
//!
//! A manifest is an ordered list of [`ShardDescriptor`]s. A descriptor's
//! position in the list is the shard's logical index: data shards come
//! first, then parity shards. On the wire a manifest is a bare JSON array:
//!
//! ```json
//! [{"path": "photo.jpg.0", "node": "node-a"}, {"path": "photo.jpg.1", "ip": "10.0.0.2"}]
//! ```

use serde::{Deserialize, Serialize};

use crate::{Checksum, ErasureConfig};

/// Errors raised while parsing or validating a manifest.
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    /// The manifest is not valid JSON or has the wrong shape.
    #[error("malformed manifest: {0}")]
    Json(#[from] serde_json::Error),

    /// The manifest lists the wrong number of shards for the configuration.
    #[error("manifest lists {actual} shards, configuration needs {expected}")]
    ShardCount {
        /// `data_shards + parity_shards`.
        expected: usize,
        /// Descriptors actually present.
        actual: usize,
    },

    /// A descriptor has an empty path.
    #[error("shard {index} has an empty path")]
    EmptyPath {
        /// Logical shard index.
        index: usize,
    },

    /// Two descriptors declare different shard sizes.
    #[error("shard {index} declares size {actual}, earlier shards declare {expected}")]
    ConflictingSize {
        /// Logical shard index of the disagreeing descriptor.
        index: usize,
        /// Size declared by the first descriptor that carried one.
        expected: u32,
        /// Size declared by this descriptor.
        actual: u32,
    },
}

/// Location of a single shard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardDescriptor {
    /// Opaque path of the shard on its node.
    pub path: String,
    /// Node holding the shard. Older manifests call this field `ip`.
    #[serde(alias = "ip")]
    pub node: String,
    /// Shard size in bytes, recorded at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u32>,
    /// BLAKE3 digest of the shard bytes, recorded at write time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<Checksum>,
}

impl ShardDescriptor {
    /// Descriptor with only a path and node.
    pub fn new(path: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            node: node.into(),
            size: None,
            checksum: None,
        }
    }
}

/// Ordered shard descriptors for one object.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShardManifest {
    shards: Vec<ShardDescriptor>,
}

impl ShardManifest {
    /// Build a manifest from descriptors in index order.
    pub fn new(shards: Vec<ShardDescriptor>) -> Self {
        Self { shards }
    }

    /// Parse a manifest from its JSON form.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse from raw JSON bytes (HTTP bodies).
    pub fn from_slice(json: &[u8]) -> Result<Self, ManifestError> {
        Ok(serde_json::from_slice(json)?)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, ManifestError> {
        Ok(serde_json::to_string_pretty(&self.shards)?)
    }

    /// Number of descriptors.
    pub fn len(&self) -> usize {
        self.shards.len()
    }

    /// Whether the manifest has no descriptors.
    pub fn is_empty(&self) -> bool {
        self.shards.is_empty()
    }

    /// Descriptors in index order.
    pub fn descriptors(&self) -> &[ShardDescriptor] {
        &self.shards
    }

    /// Descriptor at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&ShardDescriptor> {
        self.shards.get(index)
    }

    /// Check the manifest against a configuration.
    ///
    /// Verifies the descriptor count, that every path is non-empty, and that
    /// declared sizes agree. Returns the declared shard size when at least one
    /// descriptor carries one.
    pub fn validate(&self, config: &ErasureConfig) -> Result<Option<usize>, ManifestError> {
        if self.shards.len() != config.total_shards() {
            return Err(ManifestError::ShardCount {
                expected: config.total_shards(),
                actual: self.shards.len(),
            });
        }

        let mut declared: Option<u32> = None;
        for (index, shard) in self.shards.iter().enumerate() {
            if shard.path.is_empty() {
                return Err(ManifestError::EmptyPath { index });
            }
            match (declared, shard.size) {
                (None, Some(size)) => declared = Some(size),
                (Some(expected), Some(actual)) if expected != actual => {
                    return Err(ManifestError::ConflictingSize {
                        index,
                        expected,
                        actual,
                    });
                }
                _ => {}
            }
        }

        Ok(declared.map(|s| s as usize))
    }
}
