// Sparse operator support: CSR with a direct y = A x kernel.

use crate::core::traits::{Indexing, MatVec};
use crate::error::KError;
use num_traits::Float;

/// A read-only sparse matrix supporting y = A * x.
pub trait SparseMatrix<T> {
    /// Number of rows.
    fn nrows(&self) -> usize;
    /// Number of columns.
    fn ncols(&self) -> usize;
    /// Compute y = A * x.  `x.len() == ncols()`, `y.len() == nrows()`.
    fn spmv(&self, x: &[T], y: &mut [T]);
}

/// Compressed-sparse-row matrix.
///
/// Row i's entries live at positions `row_ptr[i]..row_ptr[i+1]` of
/// `col_idx`/`values`. The structure is validated once at construction;
/// the multiply kernel then indexes without further checks.
pub struct CsrMatrix<T> {
    nrows: usize,
    ncols: usize,
    row_ptr: Vec<usize>,
    col_idx: Vec<usize>,
    values: Vec<T>,
}

impl<T: Float> CsrMatrix<T> {
    /// Build a CSR from raw row-ptr, col-idx, and values.
    pub fn from_csr(
        nrows: usize,
        ncols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, KError> {
        if row_ptr.len() != nrows + 1 {
            return Err(KError::NonconformingSizes {
                expected: nrows + 1,
                found: row_ptr.len(),
            });
        }
        if col_idx.len() != values.len() {
            return Err(KError::NonconformingSizes {
                expected: col_idx.len(),
                found: values.len(),
            });
        }
        if row_ptr.first() != Some(&0) || row_ptr.last() != Some(&col_idx.len()) {
            return Err(KError::Configuration(
                "csr row pointers must start at 0 and end at nnz".into(),
            ));
        }
        if row_ptr.windows(2).any(|w| w[0] > w[1]) {
            return Err(KError::Configuration(
                "csr row pointers must be nondecreasing".into(),
            ));
        }
        if col_idx.iter().any(|&j| j >= ncols) {
            return Err(KError::Configuration(
                "csr column index out of bounds".into(),
            ));
        }
        Ok(Self { nrows, ncols, row_ptr, col_idx, values })
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.values.len()
    }
}

impl<T: Float> SparseMatrix<T> for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
    fn ncols(&self) -> usize {
        self.ncols
    }
    fn spmv(&self, x: &[T], y: &mut [T]) {
        assert_eq!(x.len(), self.ncols);
        assert_eq!(y.len(), self.nrows);
        for i in 0..self.nrows {
            let mut acc = T::zero();
            for k in self.row_ptr[i]..self.row_ptr[i + 1] {
                acc = acc + self.values[k] * x[self.col_idx[k]];
            }
            y[i] = acc;
        }
    }
}

/// CSR matrices plug straight into the Krylov engines as operators.
impl<T: Float> MatVec<Vec<T>> for CsrMatrix<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        self.spmv(x, y);
    }
}

impl<T> Indexing for CsrMatrix<T> {
    fn nrows(&self) -> usize {
        self.nrows
    }
}
