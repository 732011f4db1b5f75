//! Rank-to-rank communication.
//!
//! One `Comm` value per rank; control flow on a rank is single-threaded
//! and parallelism is across ranks. The scatter layer needs only
//! point-to-point `send`/`recv` plus the `all_reduce` collective used by
//! distributed norms and dots. Matching `send`/`recv` order across ranks
//! is the caller's obligation (an implicit collective protocol); a
//! mismatch deadlocks or corrupts data rather than being detected.

pub trait Comm {
    /// Rank of this process within the communicator.
    fn rank(&self) -> usize;
    /// Number of ranks in the communicator.
    fn size(&self) -> usize;
    /// Block until every rank has arrived.
    fn barrier(&self);
    /// Sum `x` across all ranks; every rank sees the same result.
    fn all_reduce(&self, x: f64) -> f64;
    /// Post one message to `peer`. Must not block on the receiver.
    fn send(&self, peer: usize, tag: u16, buf: &[f64]);
    /// Block until the matching message from `peer` arrives.
    fn recv(&self, peer: usize, tag: u16) -> Vec<f64>;
}

pub mod serial_comm;
pub use serial_comm::SerialComm;

pub mod local_comm;
pub use local_comm::LocalComm;

#[cfg(feature = "mpi")]
pub mod mpi_comm;
#[cfg(feature = "mpi")]
pub use mpi_comm::MpiComm;
