//! Generic scatter/gather primitive over a fixed index map.
//!
//! A `VecScatter` is a precomputed communication pattern: which of my
//! entries go to which peer, and which entries I receive from whom. It is
//! immutable once built and reused for the lifetime of its owner (the DA
//! descriptor). The Begin half posts all sends without blocking on the
//! receivers; the End half blocks for the inbound messages and applies the
//! combine mode. Every rank sharing the pattern must issue matching
//! Begin/End pairs in the same order.

use std::collections::BTreeMap;

use crate::parallel::Comm;

/// How received values combine with the destination entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertMode {
    /// Overwrite the destination entry.
    Insert,
    /// Accumulate into the destination entry.
    Add,
}

/// Whether the pattern runs source-to-destination or transposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScatterDirection {
    Forward,
    Reverse,
}

/// One element move between distributed vectors: entry `src_idx` of
/// `src_rank`'s part becomes entry `dst_idx` of `dst_rank`'s part.
#[derive(Debug, Clone, Copy)]
pub struct Transfer {
    pub src_rank: usize,
    pub src_idx: usize,
    pub dst_rank: usize,
    pub dst_idx: usize,
}

struct Block {
    peer: usize,
    idx: Vec<usize>,
}

struct Plan {
    sends: Vec<Block>,
    recvs: Vec<Block>,
    local: Vec<(usize, usize)>,
}

impl Plan {
    fn build(rank: usize, transfers: &[Transfer]) -> Plan {
        let mut sends: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut recvs: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
        let mut local = Vec::new();
        for t in transfers {
            if t.src_rank == rank && t.dst_rank == rank {
                local.push((t.src_idx, t.dst_idx));
            } else if t.src_rank == rank {
                sends.entry(t.dst_rank).or_default().push(t.src_idx);
            } else if t.dst_rank == rank {
                recvs.entry(t.src_rank).or_default().push(t.dst_idx);
            }
        }
        let into_blocks = |m: BTreeMap<usize, Vec<usize>>| {
            m.into_iter().map(|(peer, idx)| Block { peer, idx }).collect()
        };
        Plan { sends: into_blocks(sends), recvs: into_blocks(recvs), local }
    }
}

pub struct VecScatter {
    fwd: Plan,
    rev: Plan,
    tag: u16,
}

impl VecScatter {
    /// Build both the forward and the transposed plan from one transfer
    /// enumeration. Every rank must run the same enumeration in the same
    /// order, so that pack order on the sender matches unpack order on
    /// the receiver.
    pub fn from_transfers(rank: usize, tag: u16, transfers: &[Transfer]) -> Self {
        let reversed: Vec<Transfer> = transfers
            .iter()
            .map(|t| Transfer {
                src_rank: t.dst_rank,
                src_idx: t.dst_idx,
                dst_rank: t.src_rank,
                dst_idx: t.src_idx,
            })
            .collect();
        VecScatter {
            fwd: Plan::build(rank, transfers),
            rev: Plan::build(rank, &reversed),
            tag,
        }
    }

    fn plan(&self, dir: ScatterDirection) -> &Plan {
        match dir {
            ScatterDirection::Forward => &self.fwd,
            ScatterDirection::Reverse => &self.rev,
        }
    }

    fn wire_tag(&self, dir: ScatterDirection) -> u16 {
        self.tag * 2 + dir as u16
    }

    /// Post every outbound message of the pattern; does not touch `dst`.
    pub fn begin<C: Comm>(&self, src: &[f64], dir: ScatterDirection, comm: &C) {
        let plan = self.plan(dir);
        for blk in &plan.sends {
            let buf: Vec<f64> = blk.idx.iter().map(|&i| src[i]).collect();
            comm.send(blk.peer, self.wire_tag(dir), &buf);
        }
    }

    /// Apply on-rank copies, then block for each inbound message and
    /// combine it into `dst` per `mode`.
    pub fn end<C: Comm>(
        &self,
        src: &[f64],
        dst: &mut [f64],
        mode: InsertMode,
        dir: ScatterDirection,
        comm: &C,
    ) {
        let plan = self.plan(dir);
        for &(s, d) in &plan.local {
            combine(dst, d, src[s], mode);
        }
        for blk in &plan.recvs {
            let buf = comm.recv(blk.peer, self.wire_tag(dir));
            debug_assert_eq!(buf.len(), blk.idx.len());
            for (&d, &v) in blk.idx.iter().zip(&buf) {
                combine(dst, d, v, mode);
            }
        }
    }
}

fn combine(dst: &mut [f64], i: usize, v: f64, mode: InsertMode) {
    match mode {
        InsertMode::Insert => dst[i] = v,
        InsertMode::Add => dst[i] += v,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::{LocalComm, SerialComm};
    use std::thread;

    #[test]
    fn single_rank_permutation() {
        // Reverse a 4-vector on one rank.
        let transfers: Vec<Transfer> = (0..4)
            .map(|i| Transfer { src_rank: 0, src_idx: i, dst_rank: 0, dst_idx: 3 - i })
            .collect();
        let sc = VecScatter::from_transfers(0, 1, &transfers);
        let comm = SerialComm::new();
        let src = vec![1.0, 2.0, 3.0, 4.0];
        let mut dst = vec![0.0; 4];
        sc.begin(&src, ScatterDirection::Forward, &comm);
        sc.end(&src, &mut dst, InsertMode::Insert, ScatterDirection::Forward, &comm);
        assert_eq!(dst, vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn add_mode_accumulates() {
        let transfers = [
            Transfer { src_rank: 0, src_idx: 0, dst_rank: 0, dst_idx: 0 },
            Transfer { src_rank: 0, src_idx: 1, dst_rank: 0, dst_idx: 0 },
        ];
        let sc = VecScatter::from_transfers(0, 1, &transfers);
        let comm = SerialComm::new();
        let src = vec![2.0, 3.0];
        let mut dst = vec![1.0];
        sc.begin(&src, ScatterDirection::Forward, &comm);
        sc.end(&src, &mut dst, InsertMode::Add, ScatterDirection::Forward, &comm);
        assert_eq!(dst, vec![6.0]);
    }

    #[test]
    fn cross_rank_exchange_and_reverse() {
        // Rank 0 owns two entries, rank 1 owns one; the forward pattern
        // swaps rank 0's second entry with rank 1's entry.
        let transfers = [
            Transfer { src_rank: 0, src_idx: 0, dst_rank: 0, dst_idx: 0 },
            Transfer { src_rank: 0, src_idx: 1, dst_rank: 1, dst_idx: 0 },
            Transfer { src_rank: 1, src_idx: 0, dst_rank: 0, dst_idx: 1 },
        ];
        let comms = LocalComm::split(2);
        thread::scope(|s| {
            for comm in comms {
                let transfers = transfers;
                s.spawn(move || {
                    let rank = comm.rank();
                    let sc = VecScatter::from_transfers(rank, 1, &transfers);
                    let src = if rank == 0 { vec![10.0, 20.0] } else { vec![30.0] };
                    let mut dst = if rank == 0 { vec![0.0, 0.0] } else { vec![0.0] };
                    sc.begin(&src, ScatterDirection::Forward, &comm);
                    sc.end(&src, &mut dst, InsertMode::Insert, ScatterDirection::Forward, &comm);
                    if rank == 0 {
                        assert_eq!(dst, vec![10.0, 30.0]);
                    } else {
                        assert_eq!(dst, vec![20.0]);
                    }
                    // The transposed pattern moves everything back.
                    let mut back = vec![0.0; src.len()];
                    sc.begin(&dst, ScatterDirection::Reverse, &comm);
                    sc.end(&dst, &mut back, InsertMode::Insert, ScatterDirection::Reverse, &comm);
                    assert_eq!(back, src);
                });
            }
        });
    }
}
