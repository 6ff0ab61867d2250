//! Reef read and write pipelines.
//!
//! The [`ReefNode`] owns the erasure codec and the [`NodeRouter`] that maps
//! manifest node names to shard stores, and exposes the object write path
//! (encode and distribute shards) and read path (fetch in parallel,
//! reconstruct what is missing, assemble the payload).
//!
//! Protocol adapters depend on the [`ReefEngine`] trait rather than the
//! concrete node.

pub mod engine;
pub mod error;
pub mod fetcher;
pub mod node;
pub mod reader;
pub mod state;

pub use engine::ReefEngine;
pub use error::{EngineError, NodeError};
pub use fetcher::{AbsentReason, FetchConfig, FetchReport, ShardFetcher, ShardOutcome};
pub use node::{ReefNode, ReefNodeConfig};
pub use reader::{NodeRouter, ShardReader};
pub use state::{DecodeState, DecodeTracker};

#[cfg(test)]
mod tests;
