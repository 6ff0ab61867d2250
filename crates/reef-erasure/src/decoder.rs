//! Reed-Solomon erasure decoder.
//!
//! Recovers the original payload from any `k` (or more) of the `k + m`
//! shards produced by [`ErasureEncoder`](crate::ErasureEncoder).

use tracing::debug;

use crate::codec::ReedSolomon;
use crate::error::ErasureError;
use crate::payload;
use crate::presence::PresenceBitmap;

/// Decode the original payload from a partial shard set.
///
/// `shards` has one slot per shard index; `None` marks an absent shard.
/// Present shards must all have the same length.
///
/// # Errors
///
/// - [`ErasureError::InsufficientShards`] when fewer than `k` are present.
/// - [`ErasureError::ShardSizeMismatch`] when present shards disagree on size.
/// - [`ErasureError::CorruptPayload`] when the recovered header is invalid.
pub fn decode<S: AsRef<[u8]>>(
    codec: &ReedSolomon,
    shards: &[Option<S>],
) -> Result<Vec<u8>, ErasureError> {
    let k = codec.data_shards();
    let present = check_slots(codec, shards)?;

    debug!(
        k,
        m = codec.parity_shards(),
        present = present.count_present(),
        "decoding payload from shards"
    );

    // All data shards present: concatenate, no matrix work needed.
    if (0..k).all(|i| present.is_present(i)) {
        let data: Vec<&[u8]> = shards[..k]
            .iter()
            .filter_map(|s| s.as_ref().map(AsRef::as_ref))
            .collect();
        check_sizes(&data)?;
        return payload::assemble(&data);
    }

    let mut buffers = to_buffers(shards);
    codec.reconstruct_data(&mut buffers, &present)?;
    payload::assemble(&buffers[..k])
}

/// Recover every shard, parity included.
///
/// Returns `k + m` buffers in index order. Present shards are returned
/// unchanged.
pub fn reconstruct_all<S: AsRef<[u8]>>(
    codec: &ReedSolomon,
    shards: &[Option<S>],
) -> Result<Vec<Vec<u8>>, ErasureError> {
    let present = check_slots(codec, shards)?;
    let mut buffers = to_buffers(shards);
    codec.reconstruct(&mut buffers, &present)?;
    Ok(buffers)
}

fn check_slots<S>(codec: &ReedSolomon, shards: &[Option<S>]) -> Result<PresenceBitmap, ErasureError> {
    if shards.len() != codec.total_shards() {
        return Err(ErasureError::ShardCountMismatch {
            expected: codec.total_shards(),
            actual: shards.len(),
        });
    }
    let present = PresenceBitmap::from_options(shards);
    if present.count_present() < codec.data_shards() {
        return Err(ErasureError::InsufficientShards {
            needed: codec.data_shards(),
            present: present.count_present(),
        });
    }
    Ok(present)
}

fn check_sizes(data: &[&[u8]]) -> Result<(), ErasureError> {
    let expected = data.first().map_or(0, |d| d.len());
    match data.iter().position(|d| d.len() != expected) {
        Some(index) => Err(ErasureError::ShardSizeMismatch {
            index,
            expected,
            actual: data[index].len(),
        }),
        None => Ok(()),
    }
}

fn to_buffers<S: AsRef<[u8]>>(shards: &[Option<S>]) -> Vec<Vec<u8>> {
    shards
        .iter()
        .map(|s| s.as_ref().map(|b| b.as_ref().to_vec()).unwrap_or_default())
        .collect()
}
