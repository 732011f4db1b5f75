//! Distributed-array descriptor for a 2-D structured grid.
//!
//! A `Da` records how an `mx × my` grid with `dof` unknowns per node is
//! decomposed across a `px × py` processor grid, and owns the scatter
//! contexts that move data between the three orderings:
//!
//! - *global*: the solver layout, each rank's owned box stored row-major,
//!   boxes concatenated in rank order, no ghosts;
//! - *local*: the rank's owned box grown by the stencil width (clipped at
//!   the physical boundary), row-major, ghost slots included;
//! - *natural*: the application's lexicographic raster of the whole grid,
//!   distributed in the same per-rank chunk sizes as the global layout.
//!
//! The global↔local scatter is built at setup; the global↔natural scatter
//! is deferred until first use since many solves never touch natural
//! ordering. Both are immutable once built: the grid topology never
//! changes after setup, so a context is constructed at most once and
//! reused forever.

use crate::da::scatter::{InsertMode, ScatterDirection, Transfer, VecScatter};
use crate::error::KError;
use crate::parallel::Comm;

const TAG_GTOL: u16 = 1;
const TAG_GTON: u16 = 2;

#[derive(Debug, Clone, Copy)]
struct GridBox {
    xs: usize,
    xe: usize,
    ys: usize,
    ye: usize,
}

impl GridBox {
    fn width(&self) -> usize {
        self.xe - self.xs
    }
    fn nodes(&self) -> usize {
        (self.xe - self.xs) * (self.ye - self.ys)
    }
    fn contains(&self, i: usize, j: usize) -> bool {
        i >= self.xs && i < self.xe && j >= self.ys && j < self.ye
    }
}

/// Split `len` into `parts` contiguous blocks, remainder spread over the
/// leading blocks; returns the half-open range of block `idx`.
fn split_range(len: usize, parts: usize, idx: usize) -> (usize, usize) {
    let base = len / parts;
    let rem = len % parts;
    let start = idx * base + idx.min(rem);
    let extra = if idx < rem { 1 } else { 0 };
    (start, start + base + extra)
}

pub struct Da<C: Comm> {
    comm: C,
    mx: usize,
    my: usize,
    dof: usize,
    sw: usize,
    px: usize,
    py: usize,
    owned: Vec<GridBox>,
    ghosted: Vec<GridBox>,
    /// Offset of each rank's chunk in the global (and natural) layout,
    /// in scalar entries, plus a final total.
    offsets: Vec<usize>,
    gtol: VecScatter,
    gton: Option<VecScatter>,
    natural_created: bool,
}

impl<C: Comm> Da<C> {
    /// Create the descriptor and build the mandatory global↔local
    /// scatter context. Collective: every rank of `comm` must call this
    /// with identical arguments.
    pub fn new(
        comm: C,
        mx: usize,
        my: usize,
        dof: usize,
        sw: usize,
        px: usize,
        py: usize,
    ) -> Result<Self, KError> {
        if px * py != comm.size() {
            return Err(KError::Configuration(format!(
                "processor grid {px}x{py} does not match communicator size {}",
                comm.size()
            )));
        }
        if dof == 0 {
            return Err(KError::Configuration("dof must be at least 1".into()));
        }
        if px > mx || py > my {
            return Err(KError::Configuration(format!(
                "grid {mx}x{my} too small for processor grid {px}x{py}"
            )));
        }
        let size = comm.size();
        let mut owned = Vec::with_capacity(size);
        let mut ghosted = Vec::with_capacity(size);
        let mut offsets = Vec::with_capacity(size + 1);
        let mut total = 0usize;
        for r in 0..size {
            let (rx, ry) = (r % px, r / px);
            let (xs, xe) = split_range(mx, px, rx);
            let (ys, ye) = split_range(my, py, ry);
            let own = GridBox { xs, xe, ys, ye };
            ghosted.push(GridBox {
                xs: xs.saturating_sub(sw),
                xe: (xe + sw).min(mx),
                ys: ys.saturating_sub(sw),
                ye: (ye + sw).min(my),
            });
            offsets.push(total);
            total += own.nodes() * dof;
            owned.push(own);
        }
        offsets.push(total);

        let mut da = Da {
            comm,
            mx,
            my,
            dof,
            sw,
            px,
            py,
            owned,
            ghosted,
            offsets,
            // placeholder replaced right below
            gtol: VecScatter::from_transfers(0, TAG_GTOL, &[]),
            gton: None,
            natural_created: false,
        };
        da.gtol = VecScatter::from_transfers(da.comm.rank(), TAG_GTOL, &da.gtol_transfers());
        Ok(da)
    }

    pub fn comm(&self) -> &C {
        &self.comm
    }

    /// Grid extent `(mx, my)` in nodes.
    pub fn extent(&self) -> (usize, usize) {
        (self.mx, self.my)
    }

    pub fn dof(&self) -> usize {
        self.dof
    }

    pub fn stencil_width(&self) -> usize {
        self.sw
    }

    /// Total entries in the global (and natural) layout.
    pub fn global_size(&self) -> usize {
        self.mx * self.my * self.dof
    }

    /// Entries owned by this rank in the global layout.
    pub fn local_size(&self) -> usize {
        let r = self.comm.rank();
        self.offsets[r + 1] - self.offsets[r]
    }

    /// Entries in this rank's ghosted local layout.
    pub fn ghosted_size(&self) -> usize {
        self.ghosted[self.comm.rank()].nodes() * self.dof
    }

    /// Owned box of this rank: `(xs, xe, ys, ye)`, half-open.
    pub fn corners(&self) -> (usize, usize, usize, usize) {
        let b = self.owned[self.comm.rank()];
        (b.xs, b.xe, b.ys, b.ye)
    }

    /// Ghosted box of this rank: `(xs, xe, ys, ye)`, half-open.
    pub fn ghost_corners(&self) -> (usize, usize, usize, usize) {
        let b = self.ghosted[self.comm.rank()];
        (b.xs, b.xe, b.ys, b.ye)
    }

    pub fn create_global_vector(&self) -> Vec<f64> {
        vec![0.0; self.local_size()]
    }

    pub fn create_local_vector(&self) -> Vec<f64> {
        vec![0.0; self.ghosted_size()]
    }

    /// Create this rank's chunk of the natural-ordering vector. Must be
    /// called before any global↔natural scatter; the sequencing is
    /// enforced, not assumed.
    pub fn create_natural_vector(&mut self) -> Vec<f64> {
        self.natural_created = true;
        vec![0.0; self.local_size()]
    }

    fn owner_of(&self, i: usize, j: usize) -> usize {
        let rx = (0..self.px)
            .position(|rx| {
                let (xs, xe) = split_range(self.mx, self.px, rx);
                i >= xs && i < xe
            })
            .unwrap_or(self.px - 1);
        let ry = (0..self.py)
            .position(|ry| {
                let (ys, ye) = split_range(self.my, self.py, ry);
                j >= ys && j < ye
            })
            .unwrap_or(self.py - 1);
        ry * self.px + rx
    }

    /// Index of node `(i, j)` within rank `r`'s owned chunk, in entries.
    fn owned_index(&self, r: usize, i: usize, j: usize) -> usize {
        let b = self.owned[r];
        debug_assert!(b.contains(i, j));
        ((j - b.ys) * b.width() + (i - b.xs)) * self.dof
    }

    /// Index of node `(i, j)` within rank `r`'s ghosted chunk, in entries.
    fn ghosted_index(&self, r: usize, i: usize, j: usize) -> usize {
        let b = self.ghosted[r];
        debug_assert!(b.contains(i, j));
        ((j - b.ys) * b.width() + (i - b.xs)) * self.dof
    }

    /// Enumerate the global→local transfers, identically on every rank.
    fn gtol_transfers(&self) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        for r in 0..self.comm.size() {
            let g = self.ghosted[r];
            for j in g.ys..g.ye {
                for i in g.xs..g.xe {
                    let o = self.owner_of(i, j);
                    let src = self.owned_index(o, i, j);
                    let dst = self.ghosted_index(r, i, j);
                    for c in 0..self.dof {
                        transfers.push(Transfer {
                            src_rank: o,
                            src_idx: src + c,
                            dst_rank: r,
                            dst_idx: dst + c,
                        });
                    }
                }
            }
        }
        transfers
    }

    /// Enumerate the global→natural transfers, identically on every rank.
    fn gton_transfers(&self) -> Vec<Transfer> {
        let mut transfers = Vec::new();
        for o in 0..self.comm.size() {
            let b = self.owned[o];
            for j in b.ys..b.ye {
                for i in b.xs..b.xe {
                    let src = self.owned_index(o, i, j);
                    for c in 0..self.dof {
                        let nidx = (j * self.mx + i) * self.dof + c;
                        // natural chunks have the same sizes as global ones
                        let d = self.offsets.partition_point(|&off| off <= nidx) - 1;
                        transfers.push(Transfer {
                            src_rank: o,
                            src_idx: src + c,
                            dst_rank: d,
                            dst_idx: nidx - self.offsets[d],
                        });
                    }
                }
            }
        }
        transfers
    }

    fn check_len(len: usize, expected: usize) -> Result<(), KError> {
        if len != expected {
            return Err(KError::NonconformingSizes { expected, found: len });
        }
        Ok(())
    }

    /// Scatter the global vector into the ghosted local vector; must be
    /// completed with [`Da::global_to_local_end`].
    pub fn global_to_local_begin(&self, g: &[f64]) -> Result<(), KError> {
        Self::check_len(g.len(), self.local_size())?;
        self.gtol.begin(g, ScatterDirection::Forward, &self.comm);
        Ok(())
    }

    pub fn global_to_local_end(
        &self,
        g: &[f64],
        mode: InsertMode,
        l: &mut [f64],
    ) -> Result<(), KError> {
        Self::check_len(g.len(), self.local_size())?;
        Self::check_len(l.len(), self.ghosted_size())?;
        self.gtol.end(g, l, mode, ScatterDirection::Forward, &self.comm);
        Ok(())
    }

    pub fn global_to_local(&self, mode: InsertMode, g: &[f64], l: &mut [f64]) -> Result<(), KError> {
        self.global_to_local_begin(g)?;
        self.global_to_local_end(g, mode, l)
    }

    /// Copy this rank's owned interior out of the ghosted local vector
    /// into the global vector, discarding ghost values. Purely on-rank.
    pub fn local_to_global(&self, l: &[f64], g: &mut [f64]) -> Result<(), KError> {
        Self::check_len(l.len(), self.ghosted_size())?;
        Self::check_len(g.len(), self.local_size())?;
        let r = self.comm.rank();
        let b = self.owned[r];
        for j in b.ys..b.ye {
            for i in b.xs..b.xe {
                let src = self.ghosted_index(r, i, j);
                let dst = self.owned_index(r, i, j);
                g[dst..dst + self.dof].copy_from_slice(&l[src..src + self.dof]);
            }
        }
        Ok(())
    }

    /// Fold every local entry, ghosts included, back into the owning
    /// entries of the global vector, always with Add semantics: a local
    /// value never overwrites an owner's interior entry from a neighbor.
    /// Must be completed with [`Da::local_to_global_end`].
    pub fn local_to_global_begin(&self, l: &[f64]) -> Result<(), KError> {
        Self::check_len(l.len(), self.ghosted_size())?;
        self.gtol.begin(l, ScatterDirection::Reverse, &self.comm);
        Ok(())
    }

    pub fn local_to_global_end(&self, l: &[f64], g: &mut [f64]) -> Result<(), KError> {
        Self::check_len(l.len(), self.ghosted_size())?;
        Self::check_len(g.len(), self.local_size())?;
        self.gtol.end(l, g, InsertMode::Add, ScatterDirection::Reverse, &self.comm);
        Ok(())
    }

    fn ensure_gton(&mut self) -> Result<(), KError> {
        if !self.natural_created {
            return Err(KError::Sequencing(
                "natural layout vector not yet created; cannot scatter into it",
            ));
        }
        if self.gton.is_none() {
            self.gton = Some(VecScatter::from_transfers(
                self.comm.rank(),
                TAG_GTON,
                &self.gton_transfers(),
            ));
        }
        Ok(())
    }

    /// Re-order the global vector into the natural (lexicographic)
    /// layout; must be completed with [`Da::global_to_natural_end`].
    pub fn global_to_natural_begin(&mut self, g: &[f64]) -> Result<(), KError> {
        Self::check_len(g.len(), self.local_size())?;
        self.ensure_gton()?;
        let sc = self.gton.as_ref().ok_or(KError::Sequencing(
            "global-to-natural scatter context missing after setup",
        ))?;
        sc.begin(g, ScatterDirection::Forward, &self.comm);
        Ok(())
    }

    pub fn global_to_natural_end(
        &self,
        g: &[f64],
        mode: InsertMode,
        n: &mut [f64],
    ) -> Result<(), KError> {
        Self::check_len(g.len(), self.local_size())?;
        Self::check_len(n.len(), self.local_size())?;
        let sc = self.gton.as_ref().ok_or(KError::Sequencing(
            "global-to-natural end without a matching begin",
        ))?;
        sc.end(g, n, mode, ScatterDirection::Forward, &self.comm);
        Ok(())
    }

    pub fn global_to_natural(
        &mut self,
        mode: InsertMode,
        g: &[f64],
        n: &mut [f64],
    ) -> Result<(), KError> {
        self.global_to_natural_begin(g)?;
        self.global_to_natural_end(g, mode, n)
    }

    /// Re-order a natural-layout vector back into the global layout;
    /// must be completed with [`Da::natural_to_global_end`].
    pub fn natural_to_global_begin(&mut self, n: &[f64]) -> Result<(), KError> {
        Self::check_len(n.len(), self.local_size())?;
        self.ensure_gton()?;
        let sc = self.gton.as_ref().ok_or(KError::Sequencing(
            "natural-to-global scatter context missing after setup",
        ))?;
        sc.begin(n, ScatterDirection::Reverse, &self.comm);
        Ok(())
    }

    pub fn natural_to_global_end(
        &self,
        n: &[f64],
        mode: InsertMode,
        g: &mut [f64],
    ) -> Result<(), KError> {
        Self::check_len(n.len(), self.local_size())?;
        Self::check_len(g.len(), self.local_size())?;
        let sc = self.gton.as_ref().ok_or(KError::Sequencing(
            "natural-to-global end without a matching begin",
        ))?;
        sc.end(n, g, mode, ScatterDirection::Reverse, &self.comm);
        Ok(())
    }

    pub fn natural_to_global(
        &mut self,
        mode: InsertMode,
        n: &[f64],
        g: &mut [f64],
    ) -> Result<(), KError> {
        self.natural_to_global_begin(n)?;
        self.natural_to_global_end(n, mode, g)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parallel::SerialComm;

    #[test]
    fn split_range_spreads_remainder_left() {
        assert_eq!(split_range(9, 2, 0), (0, 5));
        assert_eq!(split_range(9, 2, 1), (5, 9));
        assert_eq!(split_range(3, 3, 1), (1, 2));
    }

    #[test]
    fn serial_descriptor_has_no_ghosts() {
        let da = Da::new(SerialComm::new(), 4, 3, 1, 1, 1, 1).unwrap();
        assert_eq!(da.global_size(), 12);
        assert_eq!(da.local_size(), 12);
        // Single rank: the ghosted box clips to the physical boundary.
        assert_eq!(da.ghosted_size(), 12);
        assert_eq!(da.corners(), (0, 4, 0, 3));
    }

    #[test]
    fn serial_global_to_local_is_identity() {
        let da = Da::new(SerialComm::new(), 3, 3, 1, 1, 1, 1).unwrap();
        let g: Vec<f64> = (1..=9).map(|v| v as f64).collect();
        let mut l = da.create_local_vector();
        da.global_to_local(InsertMode::Insert, &g, &mut l).unwrap();
        assert_eq!(l, g);
        let mut back = da.create_global_vector();
        da.local_to_global(&l, &mut back).unwrap();
        assert_eq!(back, g);
    }

    #[test]
    fn natural_scatter_requires_natural_vector() {
        let mut da = Da::new(SerialComm::new(), 3, 3, 1, 1, 1, 1).unwrap();
        let g = da.create_global_vector();
        let mut n = vec![0.0; 9];
        let err = da.global_to_natural(InsertMode::Insert, &g, &mut n);
        assert!(matches!(err, Err(KError::Sequencing(_))));
    }

    #[test]
    fn mismatched_processor_grid_is_rejected() {
        assert!(Da::new(SerialComm::new(), 3, 3, 1, 1, 2, 1).is_err());
    }

    #[test]
    fn dof_strides_local_layout() {
        let da = Da::new(SerialComm::new(), 2, 2, 3, 1, 1, 1).unwrap();
        assert_eq!(da.global_size(), 12);
        assert_eq!(da.ghosted_size(), 12);
        let g: Vec<f64> = (0..12).map(|v| v as f64).collect();
        let mut l = da.create_local_vector();
        da.global_to_local(InsertMode::Insert, &g, &mut l).unwrap();
        assert_eq!(l, g);
    }
}
