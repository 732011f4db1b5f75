//! Solver options populated by the caller before a solve.
//!
//! Command-line parsing is out of scope for this crate: whoever owns the
//! application is expected to fill in a `KspOptions` (or accept the
//! defaults) and hand it to `KspContext::new`. All values are immutable
//! for the duration of a solve.

/// Which side of the operator the preconditioner is applied on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PcSide {
    /// Apply M⁻¹ after the operator: solve M⁻¹A x = M⁻¹b.
    Left,
    /// Apply M⁻¹ before the operator: solve A M⁻¹ u = b, x = M⁻¹u.
    Right,
    /// Split application; not every method supports it.
    Symmetric,
}

/// Whether residual norms are computed at all.
///
/// With `NormType::None` the engines skip every norm (and the associated
/// collective reduction); termination then relies solely on the iteration
/// limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormType {
    None,
    Norm2,
}

/// Tolerances and iteration control for a Krylov solve.
#[derive(Debug, Clone)]
pub struct KspOptions {
    /// Relative decrease in residual norm required for convergence.
    pub rtol: f64,
    /// Absolute residual norm required for convergence.
    pub atol: f64,
    /// Residual growth factor at which the solve is declared divergent.
    pub divtol: f64,
    /// Iteration limit; the only mandatory termination guard.
    pub max_it: usize,
    /// Residual norm computation mode.
    pub norm_type: NormType,
    /// Preconditioner side.
    pub pc_side: PcSide,
    /// Attach a residual-logging monitor at construction.
    pub monitor: bool,
}

impl Default for KspOptions {
    fn default() -> Self {
        Self {
            rtol: 1e-5,
            atol: 1e-50,
            divtol: 1e4,
            max_it: 10_000,
            norm_type: NormType::Norm2,
            pc_side: PcSide::Left,
            monitor: false,
        }
    }
}
