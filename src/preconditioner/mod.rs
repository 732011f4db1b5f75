//! Preconditioners for the Krylov engines.
//!
//! From the engine's perspective a preconditioner is an opaque functional
//! transform: `apply` computes z = M⁻¹ r and nothing else is ever
//! inspected. `setup` lets an implementation factorize or probe the
//! operator before the first application.

use crate::error::KError;

/// A preconditioner M ≈ A⁻¹.
pub trait Preconditioner<M, V> {
    /// Apply M⁻¹ to r, writing z = M⁻¹ r.
    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError>;
    /// Optionally: setup/factorize from A.
    fn setup(&mut self, _a: &M) -> Result<(), KError> {
        Ok(())
    }
}

pub mod jacobi;
pub use jacobi::Jacobi;

pub mod ssor;
pub use ssor::Ssor;
