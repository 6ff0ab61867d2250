//! Reed-Solomon erasure encoder.
//!
//! Frames a payload, splits it into `k` data shards, generates `m` parity
//! shards, and returns all `k + m` shards with their BLAKE3 checksums.

use std::sync::Arc;

use bytes::Bytes;
use reef_types::{Checksum, ErasureConfig, ShardSet};
use tracing::debug;

use crate::codec::ReedSolomon;
use crate::error::ErasureError;
use crate::payload;

/// One encoded shard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shard {
    /// Position in the coding scheme (0..k for data, k..k+m for parity).
    pub index: usize,
    /// The raw shard bytes.
    pub data: Bytes,
    /// `blake3(data)`, recorded in the manifest.
    pub checksum: Checksum,
}

impl Shard {
    fn new(index: usize, data: Bytes) -> Self {
        let checksum = Checksum::from_data(&data);
        Self {
            index,
            data,
            checksum,
        }
    }
}

/// The output of one encode: every shard plus the shape that produced it.
#[derive(Debug, Clone)]
pub struct EncodedObject {
    /// Configuration and per-shard size.
    pub shard_set: ShardSet,
    /// Data shards first, then parity, in index order.
    pub shards: Vec<Shard>,
    /// Length of the original payload.
    pub payload_len: usize,
}

/// Erasure encoder for a fixed configuration.
///
/// Cheap to clone; the codec (and its encoding matrix) is shared.
#[derive(Debug, Clone)]
pub struct ErasureEncoder {
    codec: Arc<ReedSolomon>,
}

impl ErasureEncoder {
    /// Build an encoder, constructing a new codec for `config`.
    pub fn new(config: ErasureConfig) -> Result<Self, ErasureError> {
        Ok(Self {
            codec: Arc::new(ReedSolomon::new(config)?),
        })
    }

    /// Build an encoder around an existing shared codec.
    pub fn with_codec(codec: Arc<ReedSolomon>) -> Self {
        Self { codec }
    }

    /// The shared codec.
    pub fn codec(&self) -> &Arc<ReedSolomon> {
        &self.codec
    }

    /// Encode a payload into `k + m` shards.
    ///
    /// Empty payloads are valid and produce one-byte shards holding only
    /// the zero length header.
    pub fn encode(&self, data: &[u8]) -> Result<EncodedObject, ErasureError> {
        let config = self.codec.config();
        let (framed, shard_size) = payload::frame(data, config.data_shards)?;

        let originals: Vec<&[u8]> = framed.chunks_exact(shard_size).collect();
        debug_assert_eq!(originals.len(), config.data_shards);

        let parity = self.codec.encode_parity(&originals)?;

        let mut shards = Vec::with_capacity(config.total_shards());
        for (i, original) in originals.iter().enumerate() {
            shards.push(Shard::new(i, Bytes::copy_from_slice(original)));
        }
        for (i, rec) in parity.into_iter().enumerate() {
            shards.push(Shard::new(config.data_shards + i, Bytes::from(rec)));
        }

        debug!(
            k = config.data_shards,
            m = config.parity_shards,
            payload_len = data.len(),
            shard_size,
            "encoded payload into shards"
        );

        Ok(EncodedObject {
            shard_set: ShardSet { config, shard_size },
            shards,
            payload_len: data.len(),
        })
    }
}
