//! Error types for erasure coding operations.

/// Errors that can occur during erasure encoding or decoding.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErasureError {
    /// The `(data_shards, parity_shards)` pair cannot be used.
    #[error("invalid erasure configuration {data_shards}+{parity_shards}: {reason}")]
    InvalidConfiguration {
        /// Requested data shards.
        data_shards: usize,
        /// Requested parity shards.
        parity_shards: usize,
        /// Why the pair was rejected.
        reason: &'static str,
    },

    /// Division by the zero field element.
    #[error("division by zero in GF(256)")]
    DivisionByZero,

    /// A square submatrix of the encoding matrix could not be inverted.
    ///
    /// Any `data_shards` rows of a correctly built encoding matrix are
    /// invertible, so this indicates an engine bug rather than bad data.
    #[error("internal matrix error: submatrix is singular")]
    SingularMatrix,

    /// Fewer than `data_shards` shards are present.
    #[error("object unrecoverable: need {needed} shards, only {present} present")]
    InsufficientShards {
        /// Minimum shards required (`data_shards`).
        needed: usize,
        /// Shards actually present.
        present: usize,
    },

    /// The caller passed the wrong number of shard slots.
    #[error("wrong shard count: expected {expected}, got {actual}")]
    ShardCountMismatch {
        /// Slots the configuration requires.
        expected: usize,
        /// Slots provided.
        actual: usize,
    },

    /// A shard's length differs from the rest of its set.
    #[error("shard {index} has size {actual}, expected {expected}")]
    ShardSizeMismatch {
        /// Logical shard index.
        index: usize,
        /// Size shared by the rest of the set.
        expected: usize,
        /// Size of this shard.
        actual: usize,
    },

    /// The decoded length header points past the assembled data.
    #[error("corrupt payload: header declares {declared} bytes, only {capacity} available")]
    CorruptPayload {
        /// Length read from the header.
        declared: u64,
        /// Bytes available after the header.
        capacity: u64,
    },

    /// The assembled data is too short to hold the length header.
    #[error("corrupt payload: {len} bytes cannot hold the length header")]
    TruncatedHeader {
        /// Bytes assembled.
        len: usize,
    },

    /// The payload does not fit the 4-byte length header.
    #[error("payload of {len} bytes exceeds the 4-byte length header")]
    PayloadTooLarge {
        /// Payload length in bytes.
        len: usize,
    },
}
