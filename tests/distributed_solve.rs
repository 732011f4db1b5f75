//! End-to-end distributed solves: stencil operator on a decomposed grid,
//! inner products folded across ranks, one Krylov context per rank.
//!
//! Each rank runs the full engine on its owned part; the collective
//! reductions guarantee every rank computes identical scalars and thus
//! takes identical branches, so the verdicts must agree.

use approx::assert_abs_diff_eq;
use kryda::config::KspOptions;
use kryda::context::KspContext;
use kryda::core::wrappers::DistributedInnerProduct;
use kryda::core::MatVec;
use kryda::da::{Da, DaLaplacian};
use kryda::parallel::{Comm, LocalComm, SerialComm};
use kryda::solver::MethodKind;
use std::thread;

/// Solve A x = b where b = A * 1, so the exact solution is all ones.
fn solve_ones<C: Comm>(comm: C, method: MethodKind) -> (Vec<f64>, usize) {
    let da = Da::new(comm, 4, 4, 1, 1, 1, 2).unwrap();
    let op = DaLaplacian::new(&da).unwrap();
    let ones = vec![1.0; da.local_size()];
    let mut b = vec![0.0; da.local_size()];
    op.matvec(&ones, &mut b);

    let ip = DistributedInnerProduct::new(da.comm());
    let opts = KspOptions { rtol: 1e-12, ..Default::default() };
    let mut ksp = KspContext::with_inner_product(method, op, &opts, ip);
    let mut x = vec![0.0; b.len()];
    let reason = ksp.solve(&b, &mut x).unwrap();
    assert!(reason.is_converged(), "reason = {reason:?}");
    (x, ksp.iteration_number())
}

#[test]
fn cg_on_laplacian_across_two_ranks() {
    let comms = LocalComm::split(2);
    thread::scope(|s| {
        for comm in comms {
            s.spawn(move || {
                let (x, _) = solve_ones(comm, MethodKind::Cg);
                for xi in x {
                    assert_abs_diff_eq!(xi, 1.0, epsilon = 1e-8);
                }
            });
        }
    });
}

#[test]
fn bicgstab_on_laplacian_across_two_ranks() {
    let comms = LocalComm::split(2);
    thread::scope(|s| {
        for comm in comms {
            s.spawn(move || {
                let (x, _) = solve_ones(comm, MethodKind::Bicgstab);
                for xi in x {
                    assert_abs_diff_eq!(xi, 1.0, epsilon = 1e-8);
                }
            });
        }
    });
}

#[test]
fn two_rank_solve_matches_serial_solve() {
    // Row slabs keep the global ordering identical to the serial one, so
    // the distributed solution restricted to each rank's rows must match
    // the single-rank solution.
    let da = Da::new(SerialComm::new(), 4, 4, 1, 1, 1, 1).unwrap();
    let op = DaLaplacian::new(&da).unwrap();
    let ones = vec![1.0; 16];
    let mut b = vec![0.0; 16];
    op.matvec(&ones, &mut b);
    let ip = DistributedInnerProduct::new(da.comm());
    let opts = KspOptions { rtol: 1e-12, ..Default::default() };
    let mut ksp = KspContext::with_inner_product(MethodKind::Cg, op, &opts, ip);
    let mut x_serial = vec![0.0; 16];
    ksp.solve(&b, &mut x_serial).unwrap();

    let comms = LocalComm::split(2);
    thread::scope(|s| {
        for comm in comms {
            let x_serial = x_serial.clone();
            s.spawn(move || {
                let rank = comm.rank();
                let (x, _) = solve_ones(comm, MethodKind::Cg);
                let offset = rank * 8;
                for (k, xi) in x.iter().enumerate() {
                    assert_abs_diff_eq!(*xi, x_serial[offset + k], epsilon = 1e-8);
                }
            });
        }
    });
}
