//! Preconditioned Conjugate Gradient (Hestenes–Stiefel), SPD operators.
//!
//! Same engine shape as BiCGStab with a shorter recurrence: four work
//! vectors (r, z, p, ap). Only left preconditioning is meaningful here;
//! the preconditioner acts through the z = M⁻¹r inner-product pairing.

use crate::config::{NormType, PcSide};
use crate::context::ksp_context::KspCore;
use crate::core::traits::{InnerProduct, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use crate::solver::{residual, KrylovMethod};
use crate::utils::convergence::ConvergedReason;
use num_traits::Float;

pub struct Cg;

impl<M, V, T, I> KrylovMethod<M, V, T, I> for Cg
where
    M: MatVec<V>,
    I: InnerProduct<V, Scalar = T>,
    V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>> + Clone,
    T: Float + From<f64> + std::fmt::LowerExp,
{
    fn name(&self) -> &'static str {
        "cg"
    }

    fn setup(&self, core: &mut KspCore<V, T>) -> Result<(), KError> {
        if core.pc_side != PcSide::Left {
            return Err(KError::Unsupported(
                "cg supports left preconditioning only",
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
        let [mut r, mut z, mut p, mut ap]: [V; 4] = core.work.acquire(n)?;

        // True (unpreconditioned) residual; the preconditioner enters
        // through the z pairing below.
        residual::initial_residual(a, None, core.pc_side, x, &mut z, &mut r, b)?;

        let mut dp = T::zero();
        if core.norm_type != NormType::None {
            dp = ip.norm(&r);
        }
        core.record(0, dp);
        if core.check_converged(0, dp).is_terminal() {
            core.work.release([r, z, p, ap]);
            return Ok(());
        }

        match pc {
            Some(pc) => pc.apply(&r, &mut z)?,
            None => z.as_mut().copy_from_slice(r.as_ref()),
        }
        p.as_mut().copy_from_slice(z.as_ref());
        let mut rz = ip.dot(&r, &z);

        let mut i = 0;
        loop {
            if rz == T::zero() {
                core.set_reason(ConvergedReason::DivergedBreakdown);
                break;
            }
            a.matvec(&p, &mut ap);
            let pap = ip.dot(&p, &ap);
            if pap <= T::zero() {
                // Indefinite operator; the recurrence is undefined.
                core.set_reason(ConvergedReason::DivergedBreakdown);
                break;
            }
            let alpha = rz / pap;
            for (xj, &pj) in x.as_mut().iter_mut().zip(p.as_ref()) {
                *xj = *xj + alpha * pj;
            }
            for (rj, &apj) in r.as_mut().iter_mut().zip(ap.as_ref()) {
                *rj = *rj - alpha * apj;
            }
            match pc {
                Some(pc) => pc.apply(&r, &mut z)?,
                None => z.as_mut().copy_from_slice(r.as_ref()),
            }
            let rznew = ip.dot(&r, &z);
            if core.norm_type != NormType::None {
                dp = ip.norm(&r);
            }
            core.record(i + 1, dp);
            if core.check_converged(i + 1, dp).is_terminal() {
                break;
            }
            let beta = rznew / rz;
            rz = rznew;
            for (pj, &zj) in p.as_mut().iter_mut().zip(z.as_ref()) {
                *pj = zj + beta * *pj;
            }
            i += 1;
            if i >= core.max_it {
                break;
            }
        }
        if i == core.max_it {
            core.set_reason(ConvergedReason::DivergedIts);
        }

        core.work.release([r, z, p, ap]);
        Ok(())
    }
}
