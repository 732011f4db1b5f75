//! kryda: Krylov solvers over distributed structured-grid arrays
//!
//! This crate provides preconditioned Krylov subspace solvers (CG,
//! BiCGStab) for dense, sparse, and matrix-free operators, together with
//! a distributed-array layer for 2-D structured grids: ghost-region
//! exchange, global/local/natural reorderings, and stencil operators,
//! over serial, in-process, or MPI communicators.

pub mod parallel;

pub mod config;
pub mod context;
pub mod core;
pub mod da;
pub mod error;
pub mod matrix;
pub mod preconditioner;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use config::*;
pub use context::*;
pub use core::*;
pub use error::*;
pub use matrix::*;
pub use preconditioner::*;
pub use solver::*;
pub use utils::*;

// Re-export the verdict type at the crate root for convenience
pub use utils::convergence::ConvergedReason;
