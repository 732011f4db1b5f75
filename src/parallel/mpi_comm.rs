//! MPI-backed communicator (enabled with the `mpi` feature).
//!
//! Wraps the world communicator from `rsmpi`. Point-to-point messages map
//! to tagged standard-mode sends; the all-reduce collective maps to
//! `MPI_Allreduce` with a sum operation.

use mpi::collective::SystemOperation;
use mpi::topology::SimpleCommunicator;
use mpi::traits::*;

use super::Comm;

pub struct MpiComm {
    /// The MPI world communicator (all processes in the job).
    pub world: SimpleCommunicator,
    rank: usize,
    size: usize,
}

impl MpiComm {
    /// Initializes MPI and constructs a new `MpiComm` instance.
    ///
    /// # Panics
    /// Panics if MPI initialization fails (e.g. called twice).
    pub fn new() -> Self {
        let universe = mpi::initialize().unwrap();
        let world = universe.world();
        let rank = world.rank() as usize;
        let size = world.size() as usize;
        MpiComm { world, rank, size }
    }
}

impl Comm for MpiComm {
    fn rank(&self) -> usize {
        self.rank
    }
    fn size(&self) -> usize {
        self.size
    }
    fn barrier(&self) {
        self.world.barrier();
    }
    fn all_reduce(&self, x: f64) -> f64 {
        let mut out = 0.0;
        self.world.all_reduce_into(&x, &mut out, SystemOperation::sum());
        out
    }
    fn send(&self, peer: usize, tag: u16, buf: &[f64]) {
        self.world
            .process_at_rank(peer as i32)
            .send_with_tag(buf, tag as i32);
    }
    fn recv(&self, peer: usize, tag: u16) -> Vec<f64> {
        let (buf, _status) = self
            .world
            .process_at_rank(peer as i32)
            .receive_vec_with_tag::<f64>(tag as i32);
        buf
    }
}
