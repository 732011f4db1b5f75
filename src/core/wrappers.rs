//! Wrappers for faer dense matrix types and vector operations.
//!
//! Implements the core traits for `faer::Mat`, `faer::MatRef`, and `Vec<T>`,
//! so they can be used directly as operators and vectors in the generic
//! Krylov engines. Inner products come in two flavors: the unit type `()`
//! for on-rank vectors (with optional Rayon parallelism), and
//! `DistributedInnerProduct` which folds the local partial result across a
//! communicator so every rank sees the same scalar.

use crate::core::traits::{Indexing, InnerProduct, MatVec};
use crate::parallel::Comm;
use faer::{Mat, MatRef};
use num_traits::Float;

/// Matrix-vector multiplication for `faer::Mat`: `y = A * x`.
impl<T: Float> MatVec<Vec<T>> for Mat<T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = T::zero();
            for j in 0..self.ncols() {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }
}

/// Matrix-vector multiplication for a matrix reference (`faer::MatRef`).
impl<'a, T: Float> MatVec<Vec<T>> for MatRef<'a, T> {
    fn matvec(&self, x: &Vec<T>, y: &mut Vec<T>) {
        assert_eq!(self.nrows(), y.len(), "Output vector y has incorrect length");
        assert_eq!(self.ncols(), x.len(), "Input vector x has incorrect length");
        for i in 0..self.nrows() {
            y[i] = T::zero();
            for j in 0..self.ncols() {
                y[i] = y[i] + self[(i, j)] * x[j];
            }
        }
    }
}

/// Inner product and norm for on-rank vectors, with optional Rayon parallelism.
impl<T: Float + From<f64> + Send + Sync> InnerProduct<Vec<T>> for () {
    type Scalar = T;
    /// Computes the dot product of two vectors: `x^T y`.
    fn dot(&self, x: &Vec<T>, y: &Vec<T>) -> T {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .zip(y.as_slice().par_iter())
                .map(|(xi, yi)| *xi * *yi)
                .reduce(|| T::zero(), |acc, v| acc + v)
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .zip(y.iter())
                .map(|(xi, yi)| *xi * *yi)
                .fold(T::zero(), |acc, v| acc + v)
        }
    }
    /// Computes the Euclidean norm of a vector: `||x||_2`.
    fn norm(&self, x: &Vec<T>) -> T {
        #[cfg(feature = "rayon")]
        {
            use rayon::prelude::*;
            x.as_slice()
                .par_iter()
                .map(|xi| *xi * *xi)
                .reduce(|| T::zero(), |acc, v| acc + v)
                .sqrt()
        }
        #[cfg(not(feature = "rayon"))]
        {
            x.iter()
                .map(|xi| *xi * *xi)
                .fold(T::zero(), |acc, v| acc + v)
                .sqrt()
        }
    }
}

/// Inner product over a distributed vector: each rank holds its owned part
/// and the partial sums are combined with an all-reduce, so the result is a
/// collective operation that every rank must reach at the same iteration
/// boundary.
pub struct DistributedInnerProduct<'a, C: Comm> {
    /// The communicator spanning the ranks that share the vector.
    pub comm: &'a C,
}

impl<'a, C: Comm> DistributedInnerProduct<'a, C> {
    pub fn new(comm: &'a C) -> Self {
        Self { comm }
    }
}

impl<'a, C: Comm> InnerProduct<Vec<f64>> for DistributedInnerProduct<'a, C> {
    type Scalar = f64;
    fn dot(&self, x: &Vec<f64>, y: &Vec<f64>) -> f64 {
        assert_eq!(x.len(), y.len(), "Vectors must have the same length");
        let local: f64 = x.iter().zip(y.iter()).map(|(&a, &b)| a * b).sum();
        self.comm.all_reduce(local)
    }
    fn norm(&self, x: &Vec<f64>) -> f64 {
        let local: f64 = x.iter().map(|&a| a * a).sum();
        self.comm.all_reduce(local).sqrt()
    }
}

/// Treats a vector as a column vector.
impl<T> Indexing for Vec<T> {
    fn nrows(&self) -> usize {
        self.len()
    }
}

impl<T> Indexing for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
}
