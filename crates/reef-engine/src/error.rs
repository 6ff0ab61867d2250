//! Error types for the engine.

use std::time::Duration;

use crate::state::DecodeState;

/// Errors that can occur during engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The manifest could not be parsed or does not fit the configuration.
    #[error("manifest error: {0}")]
    Manifest(#[from] reef_types::ManifestError),

    /// Failed to access a shard store on the write path.
    #[error("store error: {0}")]
    Store(#[from] reef_store::StoreError),

    /// Erasure coding error (bad configuration, corrupt payload, matrix bug).
    #[error("erasure error: {0}")]
    Erasure(#[from] reef_erasure::ErasureError),

    /// A shard could not be written to its node.
    #[error("failed to write shard {index}: {source}")]
    Write {
        /// Logical shard index.
        index: usize,
        /// What went wrong.
        source: NodeError,
    },

    /// Too many shards are absent for the object to be rebuilt.
    #[error("object unrecoverable: need {needed} shards, only {present} present")]
    InsufficientShards {
        /// Minimum shards required (`data_shards`).
        needed: usize,
        /// Shards that were fetched intact.
        present: usize,
    },

    /// The caller's deadline passed before the fetch reached a verdict.
    #[error("shard fetch timed out after {deadline:?}: {present} of {needed} shards present")]
    Timeout {
        /// The overall deadline that elapsed.
        deadline: Duration,
        /// Shards fetched intact by then.
        present: usize,
        /// Shards required.
        needed: usize,
    },

    /// No storage nodes are configured for the write path.
    #[error("no storage nodes configured")]
    NoNodes,

    /// The decode state machine was driven through an illegal transition.
    #[error("illegal decode transition {from} -> {to}")]
    InvalidTransition {
        /// State before the transition.
        from: DecodeState,
        /// Requested state.
        to: DecodeState,
    },
}

/// Why a single shard could not be read from or written to its node.
///
/// Never surfaces from a read as a whole: the fetcher turns each of these
/// into an absent shard.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// The manifest names a node the router does not know.
    #[error("node unreachable: {0}")]
    Unreachable(String),

    /// The node has nothing at the shard's path.
    #[error("shard {path} not found on {node}")]
    NotFound {
        /// Node that was asked.
        node: String,
        /// Shard path.
        path: String,
    },

    /// The node's store failed.
    #[error("store error: {0}")]
    Store(#[from] reef_store::StoreError),
}
