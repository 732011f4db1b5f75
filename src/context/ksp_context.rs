//! Krylov solver context: one per running solve.
//!
//! `KspContext` owns the operator handle, the optional preconditioner, the
//! inner-product implementation, and a `KspCore` holding everything the
//! iteration state machine mutates: iteration counter, residual history,
//! verdict, convergence test, monitors, and the work-vector pool. The
//! caller keeps ownership of the solution and right-hand-side vectors;
//! the engine borrows them for the duration of `solve`.

use crate::config::{KspOptions, NormType, PcSide};
use crate::context::work_pool::WorkPool;
use crate::core::traits::{InnerProduct, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::{Bicgstab, Cg, KrylovMethod, MethodKind};
use crate::utils::convergence::{ConvergedReason, ConvergenceTest, DefaultConverged, SkipConverged};
use crate::utils::monitor::{Monitor, MonitorChain, ResidualMonitor};
use num_traits::Float;

/// Mutable per-solve state plus immutable-during-solve configuration.
///
/// Separated from the operator/preconditioner so a method body can borrow
/// the operator immutably while driving this state.
pub struct KspCore<V, T> {
    pub pc_side: PcSide,
    pub norm_type: NormType,
    pub max_it: usize,
    pub test: Box<dyn ConvergenceTest<T>>,
    pub monitors: MonitorChain<T>,
    pub work: WorkPool<V>,
    pub its: usize,
    pub rnorm: T,
    pub history: Vec<T>,
    pub reason: ConvergedReason,
}

impl<V, T: Float> KspCore<V, T> {
    /// Clear per-solve state; called once at the top of every solve.
    pub fn reset(&mut self) {
        self.its = 0;
        self.rnorm = T::zero();
        self.history.clear();
        self.reason = ConvergedReason::Iterating;
        self.test.reset();
    }

    /// Record one iteration: counter, norm, history, monitors.
    pub fn record(&mut self, n: usize, rnorm: T) {
        self.its = n;
        self.rnorm = rnorm;
        self.history.push(rnorm);
        self.monitors.notify(n, rnorm);
    }

    /// Run the convergence test; the verdict is monotone, so a terminal
    /// reason is never overwritten.
    pub fn check_converged(&mut self, n: usize, rnorm: T) -> ConvergedReason {
        let verdict = self.test.test(n, rnorm);
        if verdict.is_terminal() {
            self.set_reason(verdict);
        }
        self.reason
    }

    /// Set a terminal verdict unless one is already set.
    pub fn set_reason(&mut self, reason: ConvergedReason) {
        if !self.reason.is_terminal() {
            self.reason = reason;
        }
    }
}

/// Context and configuration for a Krylov subspace solver.
pub struct KspContext<M, V, T, I = ()> {
    /// The selected Krylov method.
    pub kind: MethodKind,
    /// The system operator (only `matvec` is ever requested of it).
    pub a: M,
    /// Optional preconditioner.
    pub pc: Option<Box<dyn Preconditioner<M, V>>>,
    /// Inner-product implementation (serial `()` or distributed).
    pub ip: I,
    /// Iteration state and solve-time configuration.
    pub core: KspCore<V, T>,
}

impl<M, V, T> KspContext<M, V, T, ()>
where
    M: MatVec<V>,
    (): InnerProduct<V, Scalar = T>,
    V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>> + Clone,
    T: Float + From<f64> + std::fmt::LowerExp + 'static,
{
    /// Build a context with the serial inner product.
    pub fn new(kind: MethodKind, a: M, opts: &KspOptions) -> Self {
        Self::with_inner_product(kind, a, opts, ())
    }
}

impl<M, V, T, I> KspContext<M, V, T, I>
where
    M: MatVec<V>,
    I: InnerProduct<V, Scalar = T>,
    V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>> + Clone,
    T: Float + From<f64> + std::fmt::LowerExp + 'static,
{
    /// Build a context with an explicit inner-product implementation
    /// (e.g. `DistributedInnerProduct` for DA-distributed vectors).
    pub fn with_inner_product(kind: MethodKind, a: M, opts: &KspOptions, ip: I) -> Self {
        let test: Box<dyn ConvergenceTest<T>> = match opts.norm_type {
            NormType::None => Box::new(SkipConverged),
            NormType::Norm2 => Box::new(DefaultConverged::new(
                opts.rtol.into(),
                opts.atol.into(),
                opts.divtol.into(),
            )),
        };
        let mut monitors = MonitorChain::new();
        if opts.monitor {
            // The chain is empty here, the cap cannot be hit.
            let _ = monitors.push(Box::new(ResidualMonitor));
        }
        Self {
            kind,
            a,
            pc: None,
            ip,
            core: KspCore {
                pc_side: opts.pc_side,
                norm_type: opts.norm_type,
                max_it: opts.max_it,
                test,
                monitors,
                work: WorkPool::new(),
                its: 0,
                rnorm: T::zero(),
                history: Vec::new(),
                reason: ConvergedReason::Iterating,
            },
        }
    }

    /// Attach a preconditioner; it is set up from the operator at the
    /// start of each solve.
    pub fn set_pc(&mut self, pc: Box<dyn Preconditioner<M, V>>) {
        self.pc = Some(pc);
    }

    /// Swap the convergence-test policy.
    pub fn set_convergence_test(&mut self, test: Box<dyn ConvergenceTest<T>>) {
        self.core.test = test;
    }

    /// Register an additional monitor (capped; see [`crate::utils::monitor::MAX_MONITORS`]).
    pub fn monitor_set(&mut self, m: Box<dyn Monitor<T>>) -> Result<(), KError> {
        self.core.monitors.push(m)
    }

    /// Solve A x = b. The partially-updated `x` remains valid to inspect
    /// even when the returned verdict is a `Diverged*` one; the engine
    /// never rolls back.
    pub fn solve(&mut self, b: &V, x: &mut V) -> Result<ConvergedReason, KError> {
        if b.as_ref().len() != x.as_ref().len() {
            return Err(KError::NonconformingSizes {
                expected: b.as_ref().len(),
                found: x.as_ref().len(),
            });
        }
        if let Some(pc) = self.pc.as_mut() {
            pc.setup(&self.a)?;
        }
        self.core.reset();
        let method: &dyn KrylovMethod<M, V, T, I> = match self.kind {
            MethodKind::Bicgstab => &Bicgstab,
            MethodKind::Cg => &Cg,
        };
        method.setup(&mut self.core)?;
        method.solve(&self.a, self.pc.as_deref(), &self.ip, &mut self.core, b, x)?;
        Ok(self.core.reason)
    }

    /// The verdict of the most recent solve.
    pub fn converged_reason(&self) -> ConvergedReason {
        self.core.reason
    }

    /// Iteration count of the most recent solve.
    pub fn iteration_number(&self) -> usize {
        self.core.its
    }

    /// Residual norms recorded during the most recent solve, iteration 0
    /// first; append-only within a solve.
    pub fn residual_history(&self) -> &[T] {
        &self.core.history
    }
}
