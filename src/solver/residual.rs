//! Preconditioner-aware residual sub-protocol shared by the engines.

use crate::config::PcSide;
use crate::core::traits::MatVec;
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

/// Compute the initial preconditioned residual `r`.
///
/// Raw residual is `b - A x`; with left preconditioning the
/// preconditioner is applied on top. With right preconditioning the
/// residual stays unpreconditioned and the iterate is treated as living
/// in the preconditioned basis until [`unwind_pc`] maps it back.
pub fn initial_residual<M, V, T>(
    a: &M,
    pc: Option<&dyn Preconditioner<M, V>>,
    side: PcSide,
    x: &V,
    work: &mut V,
    r: &mut V,
    b: &V,
) -> Result<(), KError>
where
    M: MatVec<V>,
    V: AsRef<[T]> + AsMut<[T]>,
    T: Float,
{
    a.matvec(x, r);
    for (rj, bj) in r.as_mut().iter_mut().zip(b.as_ref()) {
        *rj = *bj - *rj;
    }
    if let (Some(pc), PcSide::Left) = (pc, side) {
        pc.apply(r, work)?;
        r.as_mut().copy_from_slice(work.as_ref());
    }
    Ok(())
}

/// Apply the preconditioned operator `K` per the configured side:
/// left `K = B A`, right `K = A B`, none `K = A`. `work` holds the
/// intermediate product.
pub fn apply_pc_op<M, V, T>(
    a: &M,
    pc: Option<&dyn Preconditioner<M, V>>,
    side: PcSide,
    x: &V,
    y: &mut V,
    work: &mut V,
) -> Result<(), KError>
where
    M: MatVec<V>,
    V: AsRef<[T]> + AsMut<[T]>,
    T: Float,
{
    match (pc, side) {
        (None, _) => a.matvec(x, y),
        (Some(pc), PcSide::Left) => {
            a.matvec(x, work);
            pc.apply(work, y)?;
        }
        (Some(pc), PcSide::Right) => {
            pc.apply(x, work)?;
            a.matvec(work, y);
        }
        (Some(_), PcSide::Symmetric) => {
            return Err(KError::Unsupported(
                "symmetric preconditioning is not supported by this method",
            ));
        }
    }
    Ok(())
}

/// Map the working solution back into the caller's basis: for right
/// preconditioning the iterate is `u` with `x = B u`.
pub fn unwind_pc<M, V, T>(
    pc: Option<&dyn Preconditioner<M, V>>,
    side: PcSide,
    x: &mut V,
    work: &mut V,
) -> Result<(), KError>
where
    V: AsRef<[T]> + AsMut<[T]>,
    T: Float,
{
    if let (Some(pc), PcSide::Right) = (pc, side) {
        work.as_mut().copy_from_slice(x.as_ref());
        pc.apply(work, x)?;
    }
    Ok(())
}
