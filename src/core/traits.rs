//! Core linear-algebra traits for kryda.

/// Matrix–vector product: y ← A x.
///
/// The Krylov engines treat the operator as a black box: this is the only
/// operation they ever request from it.
pub trait MatVec<V> {
    /// Compute y = A · x.
    fn matvec(&self, x: &V, y: &mut V);
}

/// Inner products & norms.
///
/// Implemented by `()` for purely local vectors and by
/// [`crate::core::wrappers::DistributedInnerProduct`] for vectors whose
/// entries are spread across the ranks of a communicator. The engines are
/// generic over this seam, so the same iteration body runs serial or
/// distributed.
pub trait InnerProduct<V> {
    /// Associated scalar type.
    type Scalar: Copy + PartialOrd + From<f64>;
    /// Compute dot(x, y).
    fn dot(&self, x: &V, y: &V) -> Self::Scalar;
    /// Compute ‖x‖₂.
    fn norm(&self, x: &V) -> Self::Scalar;
}

/// Uniform indexing into vectors (dense or sparse).
pub trait Indexing {
    /// Number of rows (or length for a vector).
    fn nrows(&self) -> usize;
}
