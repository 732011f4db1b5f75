//! Convergence control and iteration monitoring.

pub mod convergence;
pub mod monitor;

pub use convergence::{ConvergedReason, ConvergenceTest, DefaultConverged, SkipConverged};
pub use monitor::{Monitor, MonitorChain, ResidualMonitor, MAX_MONITORS};
