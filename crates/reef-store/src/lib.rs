//! Shard storage trait and backend implementations.
//!
//! This crate defines the [`ShardStore`] trait for persisting shard bytes
//! under relative paths, along with its backends:
//!
//! - [`MemoryStore`]: in-memory storage backed by a `RwLock<HashMap>`.
//! - [`FileStore`]: one file per shard below a base directory.
//! - [`SlowStore`]: wraps another store and injects seeded random latency.

mod error;
mod file_store;
mod memory_store;
mod path;
mod slow_store;
mod traits;

pub use error::StoreError;
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use path::validate_path;
pub use slow_store::SlowStore;
pub use traits::ShardStore;
