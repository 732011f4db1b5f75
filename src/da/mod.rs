//! Distributed structured-grid arrays.
//!
//! [`Da`] describes a 2-D grid decomposition and mediates between the
//! global, ghosted-local, and natural orderings; [`VecScatter`] is the
//! underlying communication pattern; [`DaLaplacian`] is a matrix-free
//! stencil operator that plugs the grid into the Krylov solvers.

pub mod grid;
pub mod scatter;
pub mod stencil;

pub use grid::Da;
pub use scatter::{InsertMode, ScatterDirection, Transfer, VecScatter};
pub use stencil::DaLaplacian;
