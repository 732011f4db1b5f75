//! Symmetric Successive Over-Relaxation.
//!
//! M = ω/(2-ω) (D/ω + L) D⁻¹ (D/ω + U), applied as
//! M⁻¹ x = (2-ω)/ω (D/ω + U)⁻¹ D (D/ω + L)⁻¹ x.
//! The opaque operator is probed into dense row storage at setup, so this
//! is intended for small-to-moderate on-rank systems.

use crate::core::traits::{Indexing, MatVec};
use crate::error::KError;
use crate::preconditioner::Preconditioner;
use num_traits::Float;

pub struct Ssor<T> {
    omega: T,
    n: usize,
    rows: Vec<T>, // row-major probe of A
}

impl<T: Float> Ssor<T> {
    pub fn new(omega: T) -> Self {
        Self { omega, n: 0, rows: Vec::new() }
    }

    fn at(&self, i: usize, j: usize) -> T {
        self.rows[i * self.n + j]
    }
}

impl<M, V, T> Preconditioner<M, V> for Ssor<T>
where
    M: MatVec<V> + Indexing,
    V: AsRef<[T]> + AsMut<[T]> + From<Vec<T>>,
    T: Float,
{
    fn setup(&mut self, a: &M) -> Result<(), KError> {
        let two = T::one() + T::one();
        if self.omega <= T::zero() || self.omega >= two {
            return Err(KError::Configuration(
                "ssor relaxation factor must lie in (0, 2)".into(),
            ));
        }
        let n = a.nrows();
        self.n = n;
        self.rows = vec![T::zero(); n * n];
        let mut e = vec![T::zero(); n];
        for j in 0..n {
            e.iter_mut().for_each(|x| *x = T::zero());
            e[j] = T::one();
            let e_v = V::from(e.clone());
            let mut col_v = V::from(vec![T::zero(); n]);
            a.matvec(&e_v, &mut col_v);
            for i in 0..n {
                self.rows[i * n + j] = col_v.as_ref()[i];
            }
        }
        for i in 0..n {
            if self.at(i, i) == T::zero() {
                return Err(KError::Configuration(format!(
                    "ssor requires a nonzero diagonal, zero at row {i}"
                )));
            }
        }
        Ok(())
    }

    fn apply(&self, r: &V, z: &mut V) -> Result<(), KError> {
        let n = self.n;
        let r = r.as_ref();
        let z = z.as_mut();
        let two = T::one() + T::one();
        let w = self.omega;
        let mut u = vec![T::zero(); n];
        // forward: (D/ω + L) u = r
        for i in 0..n {
            let mut sum = r[i];
            for j in 0..i {
                sum = sum - self.at(i, j) * u[j];
            }
            u[i] = sum * w / self.at(i, i);
        }
        // scale by D
        for i in 0..n {
            u[i] = u[i] * self.at(i, i);
        }
        // backward: (D/ω + U) z = u, then the (2-ω)/ω factor
        for i in (0..n).rev() {
            let mut sum = u[i];
            for j in (i + 1)..n {
                sum = sum - self.at(i, j) * z[j];
            }
            z[i] = sum * w / self.at(i, i);
        }
        let scale = (two - w) / w;
        for zi in z.iter_mut() {
            *zi = *zi * scale;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use faer::Mat;

    #[test]
    fn omega_one_on_diagonal_matrix_is_exact_inverse() {
        // With L = U = 0 and ω = 1, M reduces to D.
        let a = Mat::from_fn(3, 3, |i, j| if i == j { (i + 1) as f64 } else { 0.0 });
        let mut pc = Ssor::new(1.0);
        Preconditioner::<Mat<f64>, Vec<f64>>::setup(&mut pc, &a).unwrap();
        let r = vec![1.0, 2.0, 3.0];
        let mut z = vec![0.0; 3];
        Preconditioner::<Mat<f64>, Vec<f64>>::apply(&pc, &r, &mut z).unwrap();
        for (zi, expect) in z.iter().zip([1.0, 1.0, 1.0]) {
            assert!((zi - expect).abs() < 1e-14);
        }
    }

    #[test]
    fn rejects_omega_out_of_range() {
        let a = Mat::<f64>::identity(2, 2);
        let mut pc = Ssor::new(2.5);
        assert!(Preconditioner::<Mat<f64>, Vec<f64>>::setup(&mut pc, &a).is_err());
    }
}
