//! Convergence verdicts and the pluggable convergence-test policies.

use num_traits::Float;

/// Outcome of a solve, or of a single convergence test.
///
/// Starts at `Iterating` and is monotone within a solve: once a terminal
/// value is reached the iteration loop stops and the verdict is never
/// reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergedReason {
    Iterating,
    ConvergedRtol,
    ConvergedAtol,
    DivergedDtol,
    DivergedBreakdown,
    DivergedIts,
}

impl ConvergedReason {
    /// True for any non-`Iterating` value.
    pub fn is_terminal(self) -> bool {
        self != ConvergedReason::Iterating
    }

    /// True only for the converged verdicts.
    pub fn is_converged(self) -> bool {
        matches!(
            self,
            ConvergedReason::ConvergedRtol | ConvergedReason::ConvergedAtol
        )
    }
}

/// Strategy interface for deciding when an iteration is finished.
///
/// `reset` is called once at the start of every solve; `test` once per
/// iteration (including iteration 0) with the current residual norm. A
/// policy may capture per-solve baselines in `reset`/the n == 0 call, but
/// must never be driven by anything other than `(n, rnorm)`.
pub trait ConvergenceTest<T> {
    fn reset(&mut self);
    fn test(&mut self, n: usize, rnorm: T) -> ConvergedReason;
}

/// The default tolerance-based test.
///
/// Convergence when `rnorm <= ttol = max(rtol * rnorm0, atol)`, divergence
/// when `rnorm >= divtol * rnorm0` or the norm is NaN. The baseline
/// `rnorm0` and the combined tolerance `ttol` are captured exactly once,
/// at iteration 0, and reused for every subsequent test in the solve.
pub struct DefaultConverged<T> {
    pub rtol: T,
    pub atol: T,
    pub divtol: T,
    baseline: Option<(T, T)>, // (rnorm0, ttol)
}

impl<T: Float> DefaultConverged<T> {
    pub fn new(rtol: T, atol: T, divtol: T) -> Self {
        Self { rtol, atol, divtol, baseline: None }
    }
}

impl<T: Float + std::fmt::LowerExp> ConvergenceTest<T> for DefaultConverged<T> {
    fn reset(&mut self) {
        self.baseline = None;
    }

    fn test(&mut self, n: usize, rnorm: T) -> ConvergedReason {
        if n == 0 {
            let ttol = (self.rtol * rnorm).max(self.atol);
            self.baseline = Some((rnorm, ttol));
        }
        // Baseline is set on the n == 0 call of the same solve.
        let Some((rnorm0, ttol)) = self.baseline else {
            return ConvergedReason::Iterating;
        };
        if rnorm <= ttol {
            if rnorm < self.atol {
                log::debug!(
                    "linear solve converged: residual norm {rnorm:e} below absolute tolerance {:e} at iteration {n}",
                    self.atol
                );
                ConvergedReason::ConvergedAtol
            } else {
                log::debug!(
                    "linear solve converged: residual norm {rnorm:e} below relative tolerance {:e} * initial norm {rnorm0:e} at iteration {n}",
                    self.rtol
                );
                ConvergedReason::ConvergedRtol
            }
        } else if rnorm >= self.divtol * rnorm0 {
            log::debug!(
                "linear solve diverging: initial residual norm {rnorm0:e}, current {rnorm:e} at iteration {n}"
            );
            ConvergedReason::DivergedDtol
        } else if rnorm != rnorm {
            log::debug!("linear solve produced NaN residual norm, declaring divergence");
            ConvergedReason::DivergedDtol
        } else {
            ConvergedReason::Iterating
        }
    }
}

/// Convergence test that never converges.
///
/// Used with `NormType::None`, where no norms are available; the engine
/// then runs until the iteration limit.
pub struct SkipConverged;

impl<T> ConvergenceTest<T> for SkipConverged {
    fn reset(&mut self) {}

    fn test(&mut self, _n: usize, _rnorm: T) -> ConvergedReason {
        ConvergedReason::Iterating
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_is_captured_once() {
        let mut conv = DefaultConverged::new(1e-6, 1e-12, 1e4);
        assert_eq!(conv.test(0, 10.0), ConvergedReason::Iterating);
        let first = conv.baseline.unwrap();
        conv.test(1, 1.0);
        conv.test(2, 0.5);
        assert_eq!(conv.baseline.unwrap(), first);
    }

    #[test]
    fn rtol_sequence() {
        // rnorm0 = 10 => ttol = max(1e-6 * 10, 1e-12) = 1e-5
        let mut conv = DefaultConverged::new(1e-6, 1e-12, 1e4);
        let verdicts: Vec<_> = [10.0, 1.0, 1e-6]
            .iter()
            .enumerate()
            .map(|(n, &r)| conv.test(n, r))
            .collect();
        assert_eq!(
            verdicts,
            vec![
                ConvergedReason::Iterating,
                ConvergedReason::Iterating,
                ConvergedReason::ConvergedRtol,
            ]
        );
    }

    #[test]
    fn atol_beats_rtol_when_below_absolute() {
        let mut conv = DefaultConverged::new(1e-6, 1e-8, 1e4);
        conv.test(0, 10.0);
        assert_eq!(conv.test(1, 1e-9), ConvergedReason::ConvergedAtol);
    }

    #[test]
    fn divergence_by_growth_factor() {
        let mut conv = DefaultConverged::new(1e-6, 1e-12, 1e4);
        assert_eq!(conv.test(0, 1.0), ConvergedReason::Iterating);
        assert_eq!(conv.test(1, 2e5), ConvergedReason::DivergedDtol);
    }

    #[test]
    fn nan_residual_is_divergence() {
        let mut conv = DefaultConverged::new(1e-6, 1e-12, 1e4);
        conv.test(0, 1.0);
        assert_eq!(conv.test(1, f64::NAN), ConvergedReason::DivergedDtol);
    }

    #[test]
    fn skip_never_terminates() {
        let mut conv = SkipConverged;
        for n in 0..100 {
            assert_eq!(conv.test(n, 1e30_f64), ConvergedReason::Iterating);
        }
    }
}
