//! Solver context types.
//!
//! [`ksp_context`] carries the per-solve state machine and configuration;
//! [`work_pool`] manages the method's work vectors.

pub mod ksp_context;
pub mod work_pool;

pub use ksp_context::{KspContext, KspCore};
pub use work_pool::WorkPool;
