//! Fock-matrix update kernels for one shell quartet
//!
//! A kernel call contracts the integral block `(MN|PQ)` with the six density
//! blocks of the quartet and accumulates
//!
//! * the Coulomb contribution to `MN` into the worker's scratch (drained by the
//!   caller once per `(M, N)`),
//! * the exchange contributions to `MP` and `NP` into scratch, flushed when
//!   `write_p` is set,
//! * the Coulomb contribution to `PQ` and the exchange contributions to `MQ`
//!   and `NQ` straight into the result buffers.
//!
//! All size variants run the same loop nest. The fixed-`Q` entry points only
//! differ by letting the compiler see the innermost trip count.
//!
//! # Ownership contract
//!
//! The M band, the N band and (with the `dup-pq-buffer` feature) the PQ
//! blocks must be written by no other worker while the call runs. This is not
//! checked: a violation gives wrong numbers, not a panic.

mod contract;
mod unit;


pub use unit::update_fock_1111;

use crate::layout::{BandView, BlockLayout};
use crate::quartet::{QuartetDims, ShellQuartet, SymmetryFlags};
use crate::scratch::ThreadScratch;
use crate::update::Destinations;
use contract::{contract, contract_q1, Dynamic, Fixed};

/// Everything a kernel call reads or writes besides scratch and integrals.
#[derive(Clone, Copy)]
pub struct KernelContext<'a> {
    pub layout: &'a BlockLayout,
    /// Blocked density matrix, see [`BlockLayout::to_blocks`].
    pub density: &'a [f64],
    /// Result band of shell M, receives K_MP and K_MQ.
    pub m_band: BandView<'a>,
    /// Result band of shell N, receives K_NP and K_NQ.
    pub n_band: BandView<'a>,
    /// Result blocks receiving J_PQ.
    pub pq_blocks: BandView<'a>,
}

/// Per-call arguments of a kernel.
#[derive(Debug, Clone, Copy)]
pub struct QuartetTask {
    pub shells: ShellQuartet,
    pub flags: SymmetryFlags,
    /// First quartet of the current P: start K_MP / K_NP scratch from zero.
    pub load_p: bool,
    /// Last quartet of the current P: flush K_MP / K_NP scratch.
    pub write_p: bool,
}

/// Density blocks of the six shell pairs of a quartet.
pub(crate) struct DensityBlocks<'a> {
    pub mn: &'a [f64],
    pub pq: &'a [f64],
    pub mp: &'a [f64],
    pub np: &'a [f64],
    pub mq: &'a [f64],
    pub nq: &'a [f64],
}

impl<'a> KernelContext<'a> {
    pub fn dims(&self, shells: ShellQuartet) -> QuartetDims {
        let layout = self.layout;
        QuartetDims::new(
            layout.shell_dim(shells.m),
            layout.shell_dim(shells.n),
            layout.shell_dim(shells.p),
            layout.shell_dim(shells.q),
        )
    }

    fn density_block(&self, a: usize, b: usize) -> &'a [f64] {
        let density: &'a [f64] = self.density;
        &density[self.layout.block_range(a, b)]
    }

    pub(crate) fn density_blocks(&self, shells: ShellQuartet) -> DensityBlocks<'a> {
        let ShellQuartet { m, n, p, q } = shells;
        DensityBlocks {
            mn: self.density_block(m, n),
            pq: self.density_block(p, q),
            mp: self.density_block(m, p),
            np: self.density_block(n, p),
            mq: self.density_block(m, q),
            nq: self.density_block(n, q),
        }
    }

    pub(crate) fn destinations(&self, shells: ShellQuartet) -> Destinations<'a> {
        let ShellQuartet { m, n, p, q } = shells;
        let layout = self.layout;
        let target = |view: &BandView<'a>, a: usize, b: usize| {
            view.block(layout.block_offset(a, b), layout.block_len(a, b))
        };
        Destinations {
            k_mp: target(&self.m_band, m, p),
            k_np: target(&self.n_band, n, p),
            j_pq: target(&self.pq_blocks, p, q),
            k_mq: target(&self.m_band, m, q),
            k_nq: target(&self.n_band, n, q),
        }
    }
}

/// Generic kernel for any shell dimensions.
pub fn update_fock_generic(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    let dim_q = ctx.layout.shell_dim(task.shells.q);
    contract(ctx, scratch, task, integrals, Dynamic(dim_q));
}

/// Kernel for an s-type Q shell, with the Q loop fused away.
pub fn update_fock_q1(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    contract_q1(ctx, scratch, task, integrals);
}

/// Kernel for a p-type Q shell.
pub fn update_fock_q3(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    contract(ctx, scratch, task, integrals, Fixed::<3>);
}

/// Kernel for a Cartesian d-type Q shell.
pub fn update_fock_q6(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    contract(ctx, scratch, task, integrals, Fixed::<6>);
}

/// Kernel for a Cartesian f-type Q shell.
pub fn update_fock_q10(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    contract(ctx, scratch, task, integrals, Fixed::<10>);
}

/// Kernel for a Cartesian g-type Q shell.
pub fn update_fock_q15(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    contract(ctx, scratch, task, integrals, Fixed::<15>);
}

/// The kernel variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KernelKind {
    /// All four shells have a single function.
    Unit,
    Q1,
    Q3,
    Q6,
    Q10,
    Q15,
    Generic,
}

impl KernelKind {
    /// Picks the most specialized kernel able to handle `dims`.
    pub fn select(dims: QuartetDims) -> Self {
        if dims.is_unit() {
            return KernelKind::Unit;
        }
        match dims.q {
            1 => KernelKind::Q1,
            3 => KernelKind::Q3,
            6 => KernelKind::Q6,
            10 => KernelKind::Q10,
            15 => KernelKind::Q15,
            _ => KernelKind::Generic,
        }
    }

    /// Whether this kernel may be used for `dims`.
    pub fn accepts(&self, dims: QuartetDims) -> bool {
        match self {
            KernelKind::Unit => dims.is_unit(),
            KernelKind::Q1 => dims.q == 1,
            KernelKind::Q3 => dims.q == 3,
            KernelKind::Q6 => dims.q == 6,
            KernelKind::Q10 => dims.q == 10,
            KernelKind::Q15 => dims.q == 15,
            KernelKind::Generic => true,
        }
    }
}

/// Runs the kernel `kind` on one quartet.
pub fn update_fock(
    kind: KernelKind,
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    match kind {
        KernelKind::Unit => update_fock_1111(ctx, scratch, task, integrals),
        KernelKind::Q1 => update_fock_q1(ctx, scratch, task, integrals),
        KernelKind::Q3 => update_fock_q3(ctx, scratch, task, integrals),
        KernelKind::Q6 => update_fock_q6(ctx, scratch, task, integrals),
        KernelKind::Q10 => update_fock_q10(ctx, scratch, task, integrals),
        KernelKind::Q15 => update_fock_q15(ctx, scratch, task, integrals),
        KernelKind::Generic => update_fock_generic(ctx, scratch, task, integrals),
    }
}
