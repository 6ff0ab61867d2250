//! Shared types for Reef.
//!
//! This crate defines the types every other crate in the workspace agrees on:
//! the redundancy configuration ([`ErasureConfig`], [`ShardSet`]), shard
//! integrity digests ([`Checksum`]), and the object manifest
//! ([`ShardManifest`], [`ShardDescriptor`]) that tells the read path where
//! each shard lives.

mod manifest;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use manifest::{ManifestError, ShardDescriptor, ShardManifest};

// ---------------------------------------------------------------------------
// Checksums
// ---------------------------------------------------------------------------

/// BLAKE3 digest of a shard's bytes.
///
/// Serialized as a 64-character lowercase hex string so manifests stay
/// readable JSON.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum([u8; 32]);

impl Checksum {
    /// Hash arbitrary data with BLAKE3.
    pub fn from_data(data: &[u8]) -> Self {
        Self(blake3::hash(data).into())
    }

    /// Return the raw 32-byte representation.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check whether `data` hashes to this checksum.
    pub fn matches(&self, data: &[u8]) -> bool {
        Self::from_data(data) == *self
    }
}

impl From<[u8; 32]> for Checksum {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Checksum({self})")
    }
}

/// Error returned when a checksum string is not 64 hex characters.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid checksum: expected 64 hex characters, got {0:?}")]
pub struct ParseChecksumError(String);

impl FromStr for Checksum {
    type Err = ParseChecksumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|_| ParseChecksumError(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Checksum {
    type Error = ParseChecksumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Checksum> for String {
    fn from(value: Checksum) -> Self {
        value.to_string()
    }
}

// ---------------------------------------------------------------------------
// Redundancy configuration
// ---------------------------------------------------------------------------

/// Erasure coding parameters: how many data and parity shards an object is
/// split into.
///
/// This type carries no validation; the erasure crate rejects unusable pairs
/// when it builds an encoding matrix from them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ErasureConfig {
    /// Number of data shards.
    pub data_shards: usize,
    /// Number of parity shards.
    pub parity_shards: usize,
}

impl ErasureConfig {
    /// Create a configuration with the given shard counts.
    pub fn new(data_shards: usize, parity_shards: usize) -> Self {
        Self {
            data_shards,
            parity_shards,
        }
    }

    /// Total number of shards (`data_shards + parity_shards`).
    pub fn total_shards(&self) -> usize {
        self.data_shards + self.parity_shards
    }
}

impl Default for ErasureConfig {
    fn default() -> Self {
        Self {
            data_shards: 4,
            parity_shards: 2,
        }
    }
}

impl fmt::Display for ErasureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{}", self.data_shards, self.parity_shards)
    }
}

/// The redundancy layout of one encoded object: its configuration plus the
/// size every shard shares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShardSet {
    /// Shard counts.
    pub config: ErasureConfig,
    /// Size of every shard in bytes, fixed at encode time.
    pub shard_size: usize,
}

impl ShardSet {
    /// Number of data shards.
    pub fn data_shards(&self) -> usize {
        self.config.data_shards
    }

    /// Number of parity shards.
    pub fn parity_shards(&self) -> usize {
        self.config.parity_shards
    }

    /// Total number of shards.
    pub fn total_shards(&self) -> usize {
        self.config.total_shards()
    }

    /// Length of all data shards concatenated.
    pub fn data_len(&self) -> usize {
        self.config.data_shards * self.shard_size
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
