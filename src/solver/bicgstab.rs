//! BiCGStab (van der Vorst, SIAM J. Sci. Stat. Comput., 1992).
//!
//! Six work vectors: r, rp (shadow residual, fixed for the whole solve),
//! v, t, s, p. All scalar breakdown tests compare against exactly 0.0:
//! a vanishing inner product signals loss of a biorthogonality direction,
//! and must not be softened into a tolerance comparison.

use crate::config::{NormType, PcSide};
use crate::context::ksp_context::KspCore;
use crate::core::traits::{InnerProduct, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::{residual, KrylovMethod};
use crate::utils::convergence::ConvergedReason;
use num_traits::Float;

pub struct Bicgstab;

impl<M, V, T, I> KrylovMethod<M, V, T, I> for Bicgstab
where
    M: MatVec<V>,
    I: InnerProduct<V, Scalar = T>,
    V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>> + Clone,
    T: Float + From<f64> + std::fmt::LowerExp,
{
    fn name(&self) -> &'static str {
        "bicgstab"
    }

    fn setup(&self, core: &mut KspCore<V, T>) -> Result<(), KError> {
        if core.pc_side == PcSide::Symmetric {
            return Err(KError::Unsupported(
                "no symmetric preconditioning for bicgstab",
            ));
        }
        Ok(())
    }

    fn solve(
        &self,
        a: &M,
        pc: Option<&dyn Preconditioner<M, V>>,
        ip: &I,
        core: &mut KspCore<V, T>,
        b: &V,
        x: &mut V,
    ) -> Result<(), KError> {
        let n = b.as_ref().len();
        let [mut r, mut rp, mut v, mut t, mut s, mut p]: [V; 6] = core.work.acquire(n)?;

        residual::initial_residual(a, pc, core.pc_side, x, &mut t, &mut r, b)?;

        let mut dp = T::zero();
        if core.norm_type != NormType::None {
            dp = ip.norm(&r);
        }
        core.record(0, dp);
        if core.check_converged(0, dp).is_terminal() {
            core.work.release([r, rp, v, t, s, p]);
            return Ok(());
        }

        // Shadow residual rp = r0, never updated again.
        rp.as_mut().copy_from_slice(r.as_ref());

        let mut rhoold = T::one();
        let mut alpha = T::one();
        let mut omegaold = T::one();
        for e in p.as_mut() {
            *e = T::zero();
        }
        for e in v.as_mut() {
            *e = T::zero();
        }

        let mut i = 0;
        loop {
            let rho = ip.dot(&r, &rp);
            if rho == T::zero() {
                core.set_reason(ConvergedReason::DivergedBreakdown);
                break;
            }
            let beta = (rho / rhoold) * (alpha / omegaold);
            // p <- r + beta * (p - omegaold * v)
            for ((pj, &rj), &vj) in p.as_mut().iter_mut().zip(r.as_ref()).zip(v.as_ref()) {
                *pj = rj + beta * (*pj - omegaold * vj);
            }
            // v <- K p
            residual::apply_pc_op(a, pc, core.pc_side, &p, &mut v, &mut t)?;
            let d1 = ip.dot(&v, &rp);
            alpha = rho / d1;
            // s <- r - alpha v
            for ((sj, &rj), &vj) in s.as_mut().iter_mut().zip(r.as_ref()).zip(v.as_ref()) {
                *sj = rj - alpha * vj;
            }
            // t <- K s; r doubles as scratch until rebuilt below
            residual::apply_pc_op(a, pc, core.pc_side, &s, &mut t, &mut r)?;
            let d1 = ip.dot(&s, &t);
            let d2 = ip.dot(&t, &t);
            if d2 == T::zero() {
                // t vanished. Only acceptable if s vanished with it, in
                // which case x + alpha p is the exact solution.
                let ss = ip.dot(&s, &s);
                if ss != T::zero() {
                    core.set_reason(ConvergedReason::DivergedBreakdown);
                    break;
                }
                for (xj, &pj) in x.as_mut().iter_mut().zip(p.as_ref()) {
                    *xj = *xj + alpha * pj;
                }
                core.record(i + 1, T::zero());
                core.set_reason(ConvergedReason::ConvergedRtol);
                break;
            }
            let omega = d1 / d2;
            // x <- x + alpha p + omega s
            for ((xj, &pj), &sj) in x.as_mut().iter_mut().zip(p.as_ref()).zip(s.as_ref()) {
                *xj = *xj + alpha * pj + omega * sj;
            }
            // r <- s - omega t
            for ((rj, &sj), &tj) in r.as_mut().iter_mut().zip(s.as_ref()).zip(t.as_ref()) {
                *rj = sj - omega * tj;
            }
            if core.norm_type != NormType::None {
                dp = ip.norm(&r);
            }
            rhoold = rho;
            omegaold = omega;
            core.record(i + 1, dp);
            if core.check_converged(i + 1, dp).is_terminal() {
                break;
            }
            i += 1;
            if i >= core.max_it {
                break;
            }
        }
        if i == core.max_it {
            core.set_reason(ConvergedReason::DivergedIts);
        }

        residual::unwind_pc(pc, core.pc_side, x, &mut t)?;
        core.work.release([r, rp, v, t, s, p]);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::config::KspOptions;
    use crate::context::KspContext;
    use crate::solver::MethodKind;
    use crate::utils::convergence::ConvergedReason;
    use approx::assert_abs_diff_eq;
    use faer::Mat;

    // Well-conditioned non-symmetric 3x3 system with known solution.
    fn nonsym_3x3() -> (Mat<f64>, Vec<f64>) {
        let a = Mat::from_fn(3, 3, |i, j| if i == j { 10.0 } else { (i + 2 * j) as f64 * 0.5 });
        let x_true = vec![1.0, 2.0, 3.0];
        let mut b = vec![0.0; 3];
        for i in 0..3 {
            for j in 0..3 {
                b[i] += a[(i, j)] * x_true[j];
            }
        }
        (a, b)
    }

    #[test]
    fn solves_well_conditioned_nonsym() {
        let (a, b) = nonsym_3x3();
        let mut x = vec![0.0; 3];
        let opts = KspOptions { rtol: 1e-10, ..Default::default() };
        let mut ksp = KspContext::new(MethodKind::Bicgstab, a, &opts);
        let reason = ksp.solve(&b, &mut x).unwrap();
        assert!(reason.is_converged(), "reason = {reason:?}");
        for (xi, ei) in x.iter().zip([1.0, 2.0, 3.0]) {
            assert_abs_diff_eq!(*xi, ei, epsilon = 1e-7);
        }
    }

    #[test]
    fn spd_2x2_converges_in_few_iterations() {
        // b = A * [1, 1] for an SPD A; expect x = [1, 1] in <= 4 iterations.
        let a = Mat::from_fn(2, 2, |i, j| if i == j { 3.0 } else { 1.0 });
        let b = vec![4.0, 4.0];
        let mut x = vec![0.0; 2];
        let opts = KspOptions { rtol: 1e-10, ..Default::default() };
        let mut ksp = KspContext::new(MethodKind::Bicgstab, a, &opts);
        let reason = ksp.solve(&b, &mut x).unwrap();
        assert!(reason.is_converged());
        assert!(ksp.iteration_number() <= 4);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-8);
        assert_abs_diff_eq!(x[1], 1.0, epsilon = 1e-8);
    }

    #[test]
    fn zero_rhs_terminates_at_iteration_zero() {
        let (a, _) = nonsym_3x3();
        let b = vec![0.0; 3];
        let mut x = vec![0.0; 3];
        let mut ksp = KspContext::new(MethodKind::Bicgstab, a, &KspOptions::default());
        let reason = ksp.solve(&b, &mut x).unwrap();
        assert_eq!(reason, ConvergedReason::ConvergedAtol);
        assert_eq!(ksp.iteration_number(), 0);
        assert_eq!(ksp.residual_history(), &[0.0]);
    }

    #[test]
    fn iteration_limit_reports_diverged_its() {
        let (a, b) = nonsym_3x3();
        let mut x = vec![0.0; 3];
        let opts = KspOptions { rtol: 1e-30, atol: 1e-300, max_it: 1, ..Default::default() };
        let mut ksp = KspContext::new(MethodKind::Bicgstab, a, &opts);
        let reason = ksp.solve(&b, &mut x).unwrap();
        assert_eq!(reason, ConvergedReason::DivergedIts);
    }
}
