//! Matrix-free 5-point Laplacian on a distributed 2-D grid.
//!
//! The operator applies the standard finite-difference stencil
//! `4u(i,j) - u(i-1,j) - u(i+1,j) - u(i,j-1) - u(i,j+1)` with homogeneous
//! Dirichlet boundary conditions (off-grid neighbors read as zero). Each
//! application refreshes the ghost region with a global-to-local scatter
//! and then sweeps this rank's owned box against the ghosted copy, so the
//! same code serves one rank or many.

use crate::core::traits::{Indexing, MatVec};
use crate::da::grid::Da;
use crate::da::scatter::InsertMode;
use crate::parallel::Comm;
use std::cell::RefCell;

pub struct DaLaplacian<'a, C: Comm> {
    da: &'a Da<C>,
    /// Ghosted scratch copy of the input, refreshed on every apply.
    local: RefCell<Vec<f64>>,
}

impl<'a, C: Comm> DaLaplacian<'a, C> {
    /// The stencil reaches one node in each direction, so the descriptor
    /// must carry at least that much ghost width and a single unknown
    /// per node.
    pub fn new(da: &'a Da<C>) -> Result<Self, crate::error::KError> {
        if da.dof() != 1 {
            return Err(crate::error::KError::Unsupported(
                "5-point Laplacian requires one unknown per grid node",
            ));
        }
        if da.stencil_width() < 1 {
            return Err(crate::error::KError::Configuration(
                "5-point Laplacian requires stencil width >= 1".into(),
            ));
        }
        Ok(DaLaplacian { da, local: RefCell::new(da.create_local_vector()) })
    }
}

impl<C: Comm> MatVec<Vec<f64>> for DaLaplacian<'_, C> {
    fn matvec(&self, x: &Vec<f64>, y: &mut Vec<f64>) {
        let mut local = self.local.borrow_mut();
        // Collective: every rank enters the scatter together.
        self.da
            .global_to_local(InsertMode::Insert, x, &mut local)
            .expect("local vector sized by this descriptor");

        let (xs, xe, ys, ye) = self.da.corners();
        let (gxs, gxe, gys, _gye) = self.da.ghost_corners();
        let gw = gxe - gxs;
        let w = xe - xs;
        let (mx, my) = self.da.extent();
        for j in ys..ye {
            for i in xs..xe {
                let li = (j - gys) * gw + (i - gxs);
                let mut v = 4.0 * local[li];
                if i > 0 {
                    v -= local[li - 1];
                }
                if i + 1 < mx {
                    v -= local[li + 1];
                }
                if j > 0 {
                    v -= local[li - gw];
                }
                if j + 1 < my {
                    v -= local[li + gw];
                }
                y[(j - ys) * w + (i - xs)] = v;
            }
        }
    }
}

impl<C: Comm> Indexing for DaLaplacian<'_, C> {
    fn nrows(&self) -> usize {
        self.da.local_size()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialComm;
    use approx::assert_abs_diff_eq;

    #[test]
    fn matches_dense_stencil_on_one_rank() {
        let da = Da::new(SerialComm::new(), 3, 3, 1, 1, 1, 1).unwrap();
        let op = DaLaplacian::new(&da).unwrap();
        // Unit impulse at the center node of a 3x3 grid.
        let mut x = vec![0.0; 9];
        x[4] = 1.0;
        let mut y = vec![0.0; 9];
        op.matvec(&x, &mut y);
        assert_abs_diff_eq!(y[4], 4.0);
        assert_abs_diff_eq!(y[1], -1.0);
        assert_abs_diff_eq!(y[3], -1.0);
        assert_abs_diff_eq!(y[5], -1.0);
        assert_abs_diff_eq!(y[7], -1.0);
        assert_abs_diff_eq!(y[0], 0.0);
    }

    #[test]
    fn corner_node_sees_dirichlet_boundary() {
        let da = Da::new(SerialComm::new(), 3, 3, 1, 1, 1, 1).unwrap();
        let op = DaLaplacian::new(&da).unwrap();
        let mut x = vec![0.0; 9];
        x[0] = 1.0;
        let mut y = vec![0.0; 9];
        op.matvec(&x, &mut y);
        // Off-grid neighbors contribute nothing; diagonal stays 4.
        assert_abs_diff_eq!(y[0], 4.0);
        assert_abs_diff_eq!(y[1], -1.0);
        assert_abs_diff_eq!(y[3], -1.0);
    }

    #[test]
    fn rejects_multicomponent_descriptor() {
        let da = Da::new(SerialComm::new(), 3, 3, 2, 1, 1, 1).unwrap();
        assert!(DaLaplacian::new(&da).is_err());
    }
}
