//! Krylov method engines.
//!
//! Every method shares the same engine shape: compute the initial
//! preconditioned residual, record iteration 0, then run the
//! method-specific recurrence, polling the convergence test and notifying
//! monitors once per iteration until a terminal verdict. `KrylovMethod`
//! is the seam; `MethodKind` enumerates the concrete methods.

use crate::context::ksp_context::KspCore;
use crate::error::KError;
use crate::preconditioner::Preconditioner;

/// Available Krylov methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// BiConjugate Gradient Stabilized (van der Vorst 1992); general
    /// nonsymmetric operators.
    Bicgstab,
    /// Conjugate Gradient; SPD operators only.
    Cg,
}

/// One Krylov method: setup validates configuration, solve runs the
/// iteration state machine. The method never retries and never rolls
/// back; every failure surfaces either as a `KError` (configuration,
/// resources) or as a terminal verdict in `core.reason` (numerics).
pub trait KrylovMethod<M, V, T, I> {
    fn name(&self) -> &'static str;

    /// Validate configuration against this method's capabilities.
    fn setup(&self, _core: &mut KspCore<V, T>) -> Result<(), KError> {
        Ok(())
    }

    /// Run one solve; the verdict lands in `core.reason`.
    fn solve(
        &self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        ip: &I,
        core: &mut KspCore<V, T>,
        b: &V,
        x: &mut V,
    ) -> Result<(), KError>;
}

pub mod residual;

pub mod bicgstab;
pub use bicgstab::Bicgstab;

pub mod cg;
pub use cg::Cg;
