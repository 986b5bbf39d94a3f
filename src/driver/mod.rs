//! A minimal caller of the kernels
//!
//! [`FockBuilder`] enumerates the symmetry-unique shell quartets, sets the
//! symmetry and `load_p` / `write_p` flags the way the kernels expect, and
//! drives one kernel call per quartet on a `rayon` pool. It does no screening
//! and no load balancing beyond handing out whole M rows.
//!
//! Band ownership comes for free here: every rayon fold owns a private bank
//! of all result blocks, so the M and N bands a call writes are never shared.
//! J_PQ blocks go to one bank shared by all folds (atomic path) unless the
//! `dup-pq-buffer` feature is on, in which case they land in the private bank
//! as well. The private banks are summed once at the end.

mod integrals;
mod reference;


pub use integrals::{model_density, IntegralSource, ModelIntegrals};
pub use reference::reference_two_electron;

use crate::kernel::{update_fock, KernelContext, KernelKind, QuartetTask};
use crate::layout::{BlockLayout, ResultBank};
use crate::quartet::{ShellQuartet, SymmetryFlags};
use crate::scratch::{scratch_capacity_for, ThreadScratch};
use crate::update::{direct_add_vector, PQ_BUFFER_DUPLICATED};
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Outcome of one Fock build.
#[derive(Debug, Clone)]
pub struct FockResult {
    /// Symmetrized two-electron part `G` of the Fock matrix.
    pub matrix: DMatrix<f64>,
    /// Number of kernel calls.
    pub quartets: usize,
    pub elapsed: Duration,
}

/// Builds the two-electron part of the Fock matrix from a density.
pub struct FockBuilder<'a, S: IntegralSource> {
    layout: &'a BlockLayout,
    source: &'a S,
    scratch_capacity: usize,
    specialize: bool,
}

impl<'a, S: IntegralSource> FockBuilder<'a, S> {
    pub fn new(layout: &'a BlockLayout, source: &'a S) -> Self {
        Self {
            layout,
            source,
            scratch_capacity: scratch_capacity_for(layout.max_dim()),
            specialize: true,
        }
    }

    /// Per-worker scratch size in doubles. Too small a value makes the build
    /// panic on the first quartet that does not fit.
    pub fn with_scratch_capacity(mut self, capacity: usize) -> Self {
        self.scratch_capacity = capacity;
        self
    }

    /// Use the size-specialized kernels (default) or the generic one only.
    pub fn with_specialized_kernels(mut self, specialize: bool) -> Self {
        self.specialize = specialize;
        self
    }

    pub fn build(&self, density: &DMatrix<f64>) -> FockResult {
        let layout = self.layout;
        let start = Instant::now();
        let density_blocks = layout.to_blocks(density);
        let shared_pq = ResultBank::for_layout(layout);

        let (mut blocks, quartets) = (0..layout.nshells())
            .into_par_iter()
            .fold(
                || Worker::new(layout, self.scratch_capacity),
                |mut worker, m| {
                    worker.process_row(self, &density_blocks, &shared_pq, m);
                    worker
                },
            )
            .map(|worker| (worker.bank.into_vec(), worker.quartets))
            .reduce(
                || (vec![0.0; layout.total_len()], 0),
                |(mut acc, n_acc), (part, n_part)| {
                    acc.iter_mut().zip(&part).for_each(|(a, b)| *a += b);
                    (acc, n_acc + n_part)
                },
            );

        if !PQ_BUFFER_DUPLICATED {
            let pq = shared_pq.into_vec();
            blocks.iter_mut().zip(&pq).for_each(|(a, b)| *a += b);
        }

        let g = layout.from_blocks(&blocks);
        let matrix = (&g + g.transpose()) * 0.5;
        let elapsed = start.elapsed();
        info!(
            "Fock build: {} shells, {} basis functions, {} quartets in {:.3?}",
            layout.nshells(),
            layout.nbf(),
            quartets,
            elapsed
        );

        FockResult {
            matrix,
            quartets,
            elapsed,
        }
    }
}

/// State owned by one rayon fold.
struct Worker {
    scratch: ThreadScratch,
    bank: ResultBank,
    integrals: Vec<f64>,
    quartets: usize,
}

impl Worker {
    fn new(layout: &BlockLayout, scratch_capacity: usize) -> Self {
        Self {
            scratch: ThreadScratch::new(scratch_capacity),
            bank: ResultBank::for_layout(layout),
            integrals: Vec::new(),
            quartets: 0,
        }
    }

    /// All unique quartets `(MN|PQ)` with `N <= M` and `PQ <= MN`.
    fn process_row<S: IntegralSource>(
        &mut self,
        builder: &FockBuilder<'_, S>,
        density: &[f64],
        shared_pq: &ResultBank,
        m: usize,
    ) {
        let layout = builder.layout;
        let Worker {
            scratch,
            bank,
            integrals,
            quartets,
        } = self;
        let pq_bank = if PQ_BUFFER_DUPLICATED {
            &*bank
        } else {
            shared_pq
        };

        let row_start = *quartets;
        for n in 0..=m {
            let ctx = KernelContext {
                layout,
                density,
                m_band: bank.band(layout, m),
                n_band: bank.band(layout, n),
                pq_blocks: pq_bank.whole(),
            };
            let mn_len = layout.block_len(m, n);
            scratch.reset_j_mn(mn_len);

            for p in 0..=m {
                let q_last = if p == m { n } else { p };
                for q in 0..=q_last {
                    let shells = ShellQuartet::new(m, n, p, q);
                    let dims = ctx.dims(shells);
                    integrals.resize(dims.integral_len(), 0.0);
                    builder.source.fill(layout, shells, integrals);

                    let task = QuartetTask {
                        shells,
                        flags: SymmetryFlags::for_quartet(shells),
                        load_p: q == 0,
                        write_p: q == q_last,
                    };
                    let kind = if builder.specialize {
                        KernelKind::select(dims)
                    } else {
                        KernelKind::Generic
                    };
                    update_fock(kind, &ctx, scratch, &task, integrals);
                    *quartets += 1;
                }
            }

            let j_mn = ctx.m_band.block(layout.block_offset(m, n), mn_len);
            direct_add_vector(j_mn, scratch.j_mn(mn_len));
        }
        debug!("shell row {} done, {} quartets", m, *quartets - row_start);
    }
}
