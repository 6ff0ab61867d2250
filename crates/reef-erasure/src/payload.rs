//! Payload framing: the length header and the split into data shards.
//!
//! Encoded form: `[u32 big-endian length][payload][zero padding]`, padded to
//! `data_shards * shard_size` and cut into `data_shards` equal chunks.

use crate::error::ErasureError;

/// Width of the big-endian length header.
pub const LENGTH_PREFIX: usize = 4;

/// Smallest shard size that fits `payload_len` bytes plus the header.
pub fn shard_size_for(payload_len: usize, data_shards: usize) -> usize {
    (payload_len + LENGTH_PREFIX).div_ceil(data_shards)
}

/// Prefix `payload` with its length and pad it for `data_shards` shards.
///
/// Returns the framed buffer (exactly `data_shards * shard_size` bytes) and
/// the shard size.
pub fn frame(payload: &[u8], data_shards: usize) -> Result<(Vec<u8>, usize), ErasureError> {
    let len = u32::try_from(payload.len())
        .map_err(|_| ErasureError::PayloadTooLarge { len: payload.len() })?;

    let shard_size = shard_size_for(payload.len(), data_shards);
    let mut framed = Vec::with_capacity(data_shards * shard_size);
    framed.extend_from_slice(&len.to_be_bytes());
    framed.extend_from_slice(payload);
    framed.resize(data_shards * shard_size, 0);

    Ok((framed, shard_size))
}

/// Concatenate data shards in index order and strip the header.
pub fn assemble<S: AsRef<[u8]>>(data_shards: &[S]) -> Result<Vec<u8>, ErasureError> {
    let total: usize = data_shards.iter().map(|s| s.as_ref().len()).sum();
    let mut buf = Vec::with_capacity(total);
    for shard in data_shards {
        buf.extend_from_slice(shard.as_ref());
    }
    unframe(buf)
}

/// Strip the length header from an assembled buffer.
pub fn unframe(mut buf: Vec<u8>) -> Result<Vec<u8>, ErasureError> {
    if buf.len() < LENGTH_PREFIX {
        return Err(ErasureError::TruncatedHeader { len: buf.len() });
    }

    let mut header = [0u8; LENGTH_PREFIX];
    header.copy_from_slice(&buf[..LENGTH_PREFIX]);
    let declared = u32::from_be_bytes(header) as usize;
    let capacity = buf.len() - LENGTH_PREFIX;

    if declared > capacity {
        return Err(ErasureError::CorruptPayload {
            declared: declared as u64,
            capacity: capacity as u64,
        });
    }

    buf.truncate(LENGTH_PREFIX + declared);
    buf.drain(..LENGTH_PREFIX);
    Ok(buf)
}
