//! In-process multi-rank communicator.
//!
//! `LocalComm::split(n)` hands out `n` communicator handles backed by
//! shared mailboxes; each handle is driven from its own thread, which
//! then plays the role of one rank. Used by the multi-rank tests and by
//! shared-memory runs that want real rank decomposition without MPI.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Barrier, Condvar, Mutex};

use super::Comm;

struct Shared {
    // keyed by (source rank, destination rank, tag)
    queues: Mutex<HashMap<(usize, usize, u16), VecDeque<Vec<f64>>>>,
    ready: Condvar,
    gate: Barrier,
    reduce: Mutex<Vec<f64>>,
}

pub struct LocalComm {
    rank: usize,
    size: usize,
    shared: Arc<Shared>,
}

impl LocalComm {
    /// Create `size` communicator handles over one shared mailbox set,
    /// one per simulated rank.
    pub fn split(size: usize) -> Vec<LocalComm> {
        assert!(size > 0);
        let shared = Arc::new(Shared {
            queues: Mutex::new(HashMap::new()),
            ready: Condvar::new(),
            gate: Barrier::new(size),
            reduce: Mutex::new(vec![0.0; size]),
        });
        (0..size)
            .map(|rank| LocalComm { rank, size, shared: shared.clone() })
            .collect()
    }
}

impl Comm for LocalComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
    fn barrier(&self) {
        self.shared.gate.wait();
    }
    fn all_reduce(&self, x: f64) -> f64 {
        {
            let mut vals = self.shared.reduce.lock().unwrap();
            vals[self.rank] = x;
        }
        self.shared.gate.wait();
        let sum = self.shared.reduce.lock().unwrap().iter().sum();
        // Second rendezvous keeps a fast rank from starting the next
        // reduction before a slow one has read this result.
        self.shared.gate.wait();
        sum
    }
    fn send(&self, peer: usize, tag: u16, buf: &[f64]) {
        let mut queues = self.shared.queues.lock().unwrap();
        queues
            .entry((self.rank, peer, tag))
            .or_default()
            .push_back(buf.to_vec());
        self.shared.ready.notify_all();
    }
    fn recv(&self, peer: usize, tag: u16) -> Vec<f64> {
        let key = (peer, self.rank, tag);
        let mut queues = self.shared.queues.lock().unwrap();
        loop {
            if let Some(buf) = queues.get_mut(&key).and_then(|q| q.pop_front()) {
                return buf;
            }
            queues = self.shared.ready.wait(queues).unwrap();
        }
    }
}
