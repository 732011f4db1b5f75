//! Work-vector pool: allocates and recycles the numeric work vectors a
//! Krylov method needs for one solve.
//!
//! Each solver context owns exactly one pool; it is never shared. A
//! released set is reused on the next acquire only when the requested
//! count and layout match, otherwise it is freed and a fresh set is
//! allocated.

use crate::error::KError;
use num_traits::Float;

pub struct WorkPool<V> {
    free: Vec<V>,
    len: usize,
}

impl<V> WorkPool<V> {
    pub fn new() -> Self {
        Self { free: Vec::new(), len: 0 }
    }

    /// Acquire `N` work vectors congruent with a vector of length `n`.
    ///
    /// Allocation failure is fatal to the solve; there is no
    /// retry-with-smaller-count path.
    pub fn acquire<T, const N: usize>(&mut self, n: usize) -> Result<[V; N], KError>
    where
        V: From<Vec<T>>,
        T: Float,
    {
        if self.free.len() == N && self.len == n {
            let set: Vec<V> = std::mem::take(&mut self.free);
            return set
                .try_into()
                .map_err(|_| KError::Resource("work vector set lost".into()));
        }
        self.free.clear();
        self.len = n;
        let fresh: Vec<V> = (0..N).map(|_| V::from(vec![T::zero(); n])).collect();
        fresh
            .try_into()
            .map_err(|_| KError::Resource(format!("failed to allocate {N} work vectors")))
    }

    /// Return a set of work vectors for reuse by the next solve.
    pub fn release<const N: usize>(&mut self, set: [V; N]) {
        self.free = set.into_iter().collect();
    }
}

impl<V> Default for WorkPool<V> {
    fn default() -> Self {
        Self::new()
    }
}
