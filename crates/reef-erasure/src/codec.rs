//! The Reed-Solomon codec: one encoding matrix, shared by every encode and
//! reconstruction for a configuration.

use reef_types::ErasureConfig;
use tracing::debug;

use crate::error::ErasureError;
use crate::field;
use crate::matrix::{self, Matrix};
use crate::presence::PresenceBitmap;

/// Reed-Solomon codec for one `(data_shards, parity_shards)` configuration.
///
/// Holds the immutable encoding matrix. Wrap it in an `Arc` to share it
/// across concurrent requests; no method takes `&mut self`.
#[derive(Debug, Clone)]
pub struct ReedSolomon {
    config: ErasureConfig,
    matrix: Matrix,
    parity_rows: Matrix,
}

impl ReedSolomon {
    /// Build the codec, rejecting unusable configurations.
    pub fn new(config: ErasureConfig) -> Result<Self, ErasureError> {
        let matrix = matrix::build_encoding_matrix(&config)?;
        let parity_rows = matrix.submatrix(
            config.data_shards,
            0,
            config.total_shards(),
            config.data_shards,
        );
        Ok(Self {
            config,
            matrix,
            parity_rows,
        })
    }

    /// The configuration this codec was built for.
    pub fn config(&self) -> ErasureConfig {
        self.config
    }

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

    /// The full `total × data` encoding matrix.
    pub fn matrix(&self) -> &Matrix {
        &self.matrix
    }

    /// Compute the parity shards for a set of equally sized data shards.
    pub fn encode_parity<S: AsRef<[u8]>>(&self, data: &[S]) -> Result<Vec<Vec<u8>>, ErasureError> {
        if data.len() != self.data_shards() {
            return Err(ErasureError::ShardCountMismatch {
                expected: self.data_shards(),
                actual: data.len(),
            });
        }
        let shard_size = common_size(data.iter().map(AsRef::as_ref).enumerate())?;

        let inputs: Vec<&[u8]> = data.iter().map(AsRef::as_ref).collect();
        Ok(code_rows(&self.parity_rows, &inputs, shard_size))
    }

    /// Check that the parity shards agree with the data shards.
    #[cfg(test)]
    pub(crate) fn verify<S: AsRef<[u8]>>(&self, shards: &[S]) -> Result<bool, ErasureError> {
        if shards.len() != self.total_shards() {
            return Err(ErasureError::ShardCountMismatch {
                expected: self.total_shards(),
                actual: shards.len(),
            });
        }
        common_size(shards.iter().map(AsRef::as_ref).enumerate())?;

        let expected = self.encode_parity(&shards[..self.data_shards()])?;
        Ok(expected
            .iter()
            .zip(&shards[self.data_shards()..])
            .all(|(want, got)| want.as_slice() == got.as_ref()))
    }

    /// Fill in every absent shard, data and parity alike.
    ///
    /// `shards` holds one buffer per index; absent slots may hold anything
    /// (they are replaced). Present buffers are never modified.
    pub fn reconstruct(
        &self,
        shards: &mut [Vec<u8>],
        present: &PresenceBitmap,
    ) -> Result<(), ErasureError> {
        self.reconstruct_rows(shards, present, self.total_shards())
    }

    /// Fill in absent data shards only; absent parity slots are left as
    /// zeroed placeholders.
    pub fn reconstruct_data(
        &self,
        shards: &mut [Vec<u8>],
        present: &PresenceBitmap,
    ) -> Result<(), ErasureError> {
        self.reconstruct_rows(shards, present, self.data_shards())
    }

    fn reconstruct_rows(
        &self,
        shards: &mut [Vec<u8>],
        present: &PresenceBitmap,
        row_limit: usize,
    ) -> Result<(), ErasureError> {
        let total = self.total_shards();
        let k = self.data_shards();

        for actual in [shards.len(), present.len()] {
            if actual != total {
                return Err(ErasureError::ShardCountMismatch {
                    expected: total,
                    actual,
                });
            }
        }

        let present_count = present.count_present();
        if present_count < k {
            return Err(ErasureError::InsufficientShards {
                needed: k,
                present: present_count,
            });
        }

        let shard_size = common_size(present.present_indices().map(|i| (i, shards[i].as_slice())))?;

        // Zeroed placeholders keep row addressing uniform.
        let missing: Vec<usize> = present.absent_indices().collect();
        for &i in &missing {
            shards[i] = vec![0u8; shard_size];
        }

        let targets: Vec<usize> = missing.iter().copied().filter(|&i| i < row_limit).collect();
        if targets.is_empty() {
            return Ok(());
        }

        // The first k present rows, in index order, form the square system.
        let selected: Vec<usize> = present.present_indices().take(k).collect();
        let decode = self.matrix.select_rows(&selected).invert()?;

        // Row i of the encoding matrix times the inverse gives the
        // coefficients that rebuild shard i from the selected shards.
        let coefficients = self.matrix.select_rows(&targets).multiply(&decode);

        let inputs: Vec<&[u8]> = selected.iter().map(|&i| shards[i].as_slice()).collect();
        let rebuilt = code_rows(&coefficients, &inputs, shard_size);

        debug!(
            config = %self.config,
            shard_size,
            selected = ?selected,
            rebuilt = ?targets,
            "reconstructed missing shards"
        );

        for (index, data) in targets.into_iter().zip(rebuilt) {
            shards[index] = data;
        }
        Ok(())
    }
}

/// Multiply each row of `rows` against `inputs`, byte by byte.
fn code_rows(rows: &Matrix, inputs: &[&[u8]], shard_size: usize) -> Vec<Vec<u8>> {
    debug_assert_eq!(rows.cols(), inputs.len());
    (0..rows.rows())
        .map(|r| {
            let mut out = vec![0u8; shard_size];
            for (c, input) in inputs.iter().enumerate() {
                if c == 0 {
                    field::mul_slice(rows.get(r, c), input, &mut out);
                } else {
                    field::mul_add_slice(rows.get(r, c), input, &mut out);
                }
            }
            out
        })
        .collect()
}

/// Size shared by every shard, or the first one that disagrees.
fn common_size<'a>(
    mut shards: impl Iterator<Item = (usize, &'a [u8])>,
) -> Result<usize, ErasureError> {
    let Some((_, first)) = shards.next() else {
        return Ok(0);
    };
    let expected = first.len();
    for (index, shard) in shards {
        if shard.len() != expected {
            return Err(ErasureError::ShardSizeMismatch {
                index,
                expected,
                actual: shard.len(),
            });
        }
    }
    Ok(expected)
}
