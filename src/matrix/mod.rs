//! Matrix module: dense and sparse operator types.

pub mod dense;
pub use dense::DenseMatrix;
pub mod sparse;
pub use sparse::{CsrMatrix, SparseMatrix};
