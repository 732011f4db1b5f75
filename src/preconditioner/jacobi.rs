// Jacobi preconditioner: M⁻¹ = D⁻¹.

use crate::core::traits::{Indexing, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

pub struct Jacobi<T> {
    inv_diag: Vec<T>,
}

impl<T: Float> Jacobi<T> {
    /// New with empty state; the diagonal is probed in `setup`.
    pub fn new() -> Self {
        Self { inv_diag: Vec::new() }
    }
}

impl<T: Float> Default for Jacobi<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, V, T> Preconditioner<M, V> for Jacobi<T>
where
    M: MatVec<V> + Indexing,
    V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>>,
    T: Float,
{
    // The operator is opaque, so the diagonal is probed with basis
    // vectors; n matvecs at setup.
    fn setup(&mut self, a: &M) -> Result<(), KError> {
        let n = a.nrows();
        let mut diag = vec![T::zero(); n];
        let mut e = vec![T::zero(); n];
        for i in 0..n {
            e.iter_mut().for_each(|x| *x = T::zero());
            e[i] = T::one();
            let e_v = V::from(e.clone());
            let mut col_v = V::from(vec![T::zero(); n]);
            a.matvec(&e_v, &mut col_v);
            diag[i] = col_v.as_ref()[i];
        }
        self.inv_diag = diag
            .into_iter()
            .map(|d| if d != T::zero() { T::one() / d } else { T::zero() })
            .collect();
        Ok(())
    }

    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError> {
        let r_ref = r.as_ref();
        let z_mut = z.as_mut();
        for i in 0..r_ref.len() {
            z_mut[i] = self.inv_diag[i] * r_ref[i];
        }
        Ok(())
    }
}
