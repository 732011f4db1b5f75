//! Iteration monitors: ordered observer callbacks for diagnostics.
//!
//! Monitors are invoked synchronously after every iteration, including
//! iteration 0, with the iteration index and residual norm. They are
//! side-effect only and never influence control flow. Per-monitor teardown
//! is the monitor value's `Drop`.

use crate::error::KError;

/// Maximum number of registered monitors per solver context.
pub const MAX_MONITORS: usize = 5;

/// A per-iteration observer.
pub trait Monitor<T> {
    fn monitor(&mut self, its: usize, rnorm: T);
}

/// Any `FnMut(usize, T)` closure is a monitor.
impl<T, F: FnMut(usize, T)> Monitor<T> for F {
    fn monitor(&mut self, its: usize, rnorm: T) {
        self(its, rnorm)
    }
}

/// Logs the residual norm each iteration in the classic text shape.
pub struct ResidualMonitor;

impl<T: std::fmt::LowerExp> Monitor<T> for ResidualMonitor {
    fn monitor(&mut self, its: usize, rnorm: T) {
        log::info!("{its:3} KSP Residual norm {rnorm:e}");
    }
}

/// Ordered chain of monitors, capped at `MAX_MONITORS`.
pub struct MonitorChain<T> {
    entries: Vec<Box<dyn Monitor<T>>>,
}

impl<T: Copy> MonitorChain<T> {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Register a monitor; insertion order is invocation order.
    pub fn push(&mut self, m: Box<dyn Monitor<T>>) -> Result<(), KError> {
        if self.entries.len() >= MAX_MONITORS {
            return Err(KError::Configuration(format!(
                "too many monitors set, maximum is {MAX_MONITORS}"
            )));
        }
        self.entries.push(m);
        Ok(())
    }

    /// Invoke every monitor, in insertion order, on the calling thread.
    pub fn notify(&mut self, its: usize, rnorm: T) {
        for m in self.entries.iter_mut() {
            m.monitor(its, rnorm);
        }
    }

    /// Drop all registered monitors.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<T: Copy> Default for MonitorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn invoked_in_insertion_order() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut chain: MonitorChain<f64> = MonitorChain::new();
        for id in 0..3 {
            let seen = seen.clone();
            chain
                .push(Box::new(move |its: usize, _r: f64| {
                    seen.borrow_mut().push((id, its));
                }))
                .unwrap();
        }
        chain.notify(0, 1.0);
        chain.notify(1, 0.5);
        assert_eq!(
            *seen.borrow(),
            vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]
        );
    }

    #[test]
    fn capped_at_max() {
        let mut chain: MonitorChain<f64> = MonitorChain::new();
        for _ in 0..MAX_MONITORS {
            chain.push(Box::new(|_, _| {})).unwrap();
        }
        assert!(chain.push(Box::new(|_, _| {})).is_err());
        assert_eq!(chain.len(), MAX_MONITORS);
    }

    #[test]
    fn clear_runs_teardown() {
        struct Flagged(Rc<RefCell<bool>>);
        impl Drop for Flagged {
            fn drop(&mut self) {
                *self.0.borrow_mut() = true;
            }
        }
        impl Monitor<f64> for Flagged {
            fn monitor(&mut self, _its: usize, _rnorm: f64) {}
        }

        let dropped = Rc::new(RefCell::new(false));
        let mut chain: MonitorChain<f64> = MonitorChain::new();
        chain.push(Box::new(Flagged(dropped.clone()))).unwrap();
        chain.clear();
        assert!(*dropped.borrow());
        assert!(chain.is_empty());
    }
}
