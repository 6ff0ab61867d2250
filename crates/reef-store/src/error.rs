//! Error types for shard storage operations.

/// Errors that can occur during shard storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Nothing is stored under the requested path.
    #[error("shard not found: {0}")]
    NotFound(String),

    /// An I/O error occurred.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The store has reached its capacity limit.
    #[error("store capacity exceeded: need {needed} bytes, only {available} available")]
    CapacityExceeded {
        /// Bytes needed for the operation.
        needed: u64,
        /// Bytes currently available.
        available: u64,
    },

    /// The shard path would escape the store or is otherwise unusable.
    #[error("invalid shard path {path:?}: {reason}")]
    InvalidPath {
        /// The rejected path.
        path: String,
        /// Why it was rejected.
        reason: &'static str,
    },
}
