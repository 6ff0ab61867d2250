//! Dense matrices over GF(256) and the encoding matrix builder.
//!
//! Matrices are a flat row-major `Vec<u8>`; there is no per-element type.

use reef_types::ErasureConfig;

use crate::error::ErasureError;
use crate::field::{self, FIELD_SIZE};

/// A `rows × cols` matrix of field elements, stored row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<u8>,
}

impl Matrix {
    /// All-zero matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            data: vec![0; rows * cols],
        }
    }

    /// `n × n` identity matrix.
    pub fn identity(n: usize) -> Self {
        let mut m = Self::zeros(n, n);
        for i in 0..n {
            m.set(i, i, 1);
        }
        m
    }

    /// Build from row slices. All rows must have the same length.
    pub fn from_rows(rows: &[&[u8]]) -> Self {
        let cols = rows.first().map_or(0, |r| r.len());
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            assert_eq!(row.len(), cols, "ragged matrix rows");
            data.extend_from_slice(row);
        }
        Self {
            rows: rows.len(),
            cols,
            data,
        }
    }

    /// Vandermonde matrix: entry `(r, c)` is `r^c`.
    ///
    /// Row `r` is generated from the field value `r`, so rows are pairwise
    /// distinct as long as `rows <= 256`.
    pub fn vandermonde(rows: usize, cols: usize) -> Self {
        debug_assert!(rows <= FIELD_SIZE);
        let mut m = Self::zeros(rows, cols);
        for r in 0..rows {
            for c in 0..cols {
                m.set(r, c, field::exp(r as u8, c));
            }
        }
        m
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Entry at `(r, c)`.
    #[inline]
    pub fn get(&self, r: usize, c: usize) -> u8 {
        self.data[r * self.cols + c]
    }

    /// Overwrite the entry at `(r, c)`.
    #[inline]
    pub fn set(&mut self, r: usize, c: usize, value: u8) {
        self.data[r * self.cols + c] = value;
    }

    /// Row `r` as a slice.
    pub fn row(&self, r: usize) -> &[u8] {
        &self.data[r * self.cols..(r + 1) * self.cols]
    }

    /// Matrix product `self × rhs`.
    pub fn multiply(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(self.cols, rhs.rows, "matrix dimensions do not agree");
        let mut out = Matrix::zeros(self.rows, rhs.cols);
        for r in 0..self.rows {
            for c in 0..rhs.cols {
                let mut acc = 0u8;
                for i in 0..self.cols {
                    acc ^= field::mul(self.get(r, i), rhs.get(i, c));
                }
                out.set(r, c, acc);
            }
        }
        out
    }

    /// Copy of rows `[rmin, rmax)` and columns `[cmin, cmax)`.
    pub fn submatrix(&self, rmin: usize, cmin: usize, rmax: usize, cmax: usize) -> Matrix {
        let mut out = Matrix::zeros(rmax - rmin, cmax - cmin);
        for r in rmin..rmax {
            for c in cmin..cmax {
                out.set(r - rmin, c - cmin, self.get(r, c));
            }
        }
        out
    }

    /// New matrix made of the given rows, in the given order.
    pub fn select_rows(&self, rows: &[usize]) -> Matrix {
        let mut data = Vec::with_capacity(rows.len() * self.cols);
        for &r in rows {
            data.extend_from_slice(self.row(r));
        }
        Matrix {
            rows: rows.len(),
            cols: self.cols,
            data,
        }
    }

    fn swap_rows(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for c in 0..self.cols {
            self.data.swap(a * self.cols + c, b * self.cols + c);
        }
    }

    /// Inverse by Gauss-Jordan elimination on `[self | I]`.
    ///
    /// Returns [`ErasureError::SingularMatrix`] if no inverse exists.
    pub fn invert(&self) -> Result<Matrix, ErasureError> {
        assert_eq!(self.rows, self.cols, "only square matrices are invertible");
        let n = self.rows;

        let mut work = Matrix::zeros(n, 2 * n);
        for r in 0..n {
            for c in 0..n {
                work.set(r, c, self.get(r, c));
            }
            work.set(r, n + r, 1);
        }

        for col in 0..n {
            let pivot = (col..n)
                .find(|&r| work.get(r, col) != 0)
                .ok_or(ErasureError::SingularMatrix)?;
            work.swap_rows(col, pivot);

            let scale = field::inv(work.get(col, col))?;
            if scale != 1 {
                for c in 0..2 * n {
                    work.set(col, c, field::mul(work.get(col, c), scale));
                }
            }

            for r in 0..n {
                let factor = work.get(r, col);
                if r == col || factor == 0 {
                    continue;
                }
                for c in 0..2 * n {
                    let v = field::add(work.get(r, c), field::mul(factor, work.get(col, c)));
                    work.set(r, c, v);
                }
            }
        }

        Ok(work.submatrix(0, n, n, 2 * n))
    }
}

/// Check that a configuration can be backed by an encoding matrix.
pub fn validate_config(config: &ErasureConfig) -> Result<(), ErasureError> {
    let reject = |reason| ErasureError::InvalidConfiguration {
        data_shards: config.data_shards,
        parity_shards: config.parity_shards,
        reason,
    };

    if config.data_shards == 0 {
        return Err(reject("data_shards must be at least 1"));
    }
    if config.parity_shards == 0 {
        return Err(reject("parity_shards must be at least 1"));
    }
    if config.total_shards() > FIELD_SIZE {
        return Err(reject("at most 256 shards fit in GF(256)"));
    }
    Ok(())
}

/// Build the `total × data` encoding matrix for a configuration.
///
/// Starts from a Vandermonde matrix, whose rows are evaluations at distinct
/// points so any `data_shards` of them are independent, and multiplies it by
/// the inverse of its top square. The top rows become the identity (data
/// shards encode to themselves) while every `data_shards`-row selection stays
/// invertible, because each is an invertible matrix times an invertible one.
pub fn build_encoding_matrix(config: &ErasureConfig) -> Result<Matrix, ErasureError> {
    validate_config(config)?;

    let k = config.data_shards;
    let vandermonde = Matrix::vandermonde(config.total_shards(), k);
    let top = vandermonde.submatrix(0, 0, k, k);
    Ok(vandermonde.multiply(&top.invert()?))
}
