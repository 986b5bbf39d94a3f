//! The four-index contraction shared by all size variants

use super::{DensityBlocks, KernelContext, QuartetTask};
use crate::quartet::{Coefficients, QuartetDims};
use crate::scratch::{ScratchRegions, ThreadScratch};
use crate::update::{update_global_vectors, Destinations};

/// Trip count of the innermost (Q) loop.
pub(crate) trait InnerDim: Copy {
    fn get(self) -> usize;
}

/// Compile-time Q dimension; lets the compiler unroll the Q loop.
#[derive(Clone, Copy)]
pub(crate) struct Fixed<const Q: usize>;

impl<const Q: usize> InnerDim for Fixed<Q> {
    #[inline(always)]
    fn get(self) -> usize {
        Q
    }
}

/// Q dimension only known at run time.
#[derive(Clone, Copy)]
pub(crate) struct Dynamic(pub usize);

impl InnerDim for Dynamic {
    #[inline(always)]
    fn get(self) -> usize {
        self.0
    }
}

/// Inputs and outputs of one call, resolved from the context.
struct Frame<'a> {
    dims: QuartetDims,
    coef: Coefficients,
    density: DensityBlocks<'a>,
    dst: Destinations<'a>,
}

impl<'a> Frame<'a> {
    fn new(ctx: &KernelContext<'a>, task: &QuartetTask, integrals: &[f64], dim_q: usize) -> Self {
        let dims = ctx.dims(task.shells);
        assert_eq!(
            dims.q, dim_q,
            "kernel for Q = {} called on quartet {:?}",
            dim_q, task.shells
        );
        assert_eq!(
            integrals.len(),
            dims.integral_len(),
            "integral block does not match quartet {:?}",
            dims
        );
        Self {
            dims,
            coef: task.flags.coefficients(),
            density: ctx.density_blocks(task.shells),
            dst: ctx.destinations(task.shells),
        }
    }

    fn regions<'s>(&self, scratch: &'s mut ThreadScratch, load_p: bool) -> ScratchRegions<'s> {
        let mut buf = scratch.regions(self.dims);
        if load_p {
            buf.clear_p_bands();
        }
        buf.clear_q_bands();
        buf
    }
}

#[inline(always)]
pub(crate) fn contract<D: InnerDim>(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
    inner: D,
) {
    let dim_q = inner.get();
    let frame = Frame::new(ctx, task, integrals, dim_q);
    let QuartetDims {
        m: dim_m,
        n: dim_n,
        p: dim_p,
        ..
    } = frame.dims;
    let coef = frame.coef;
    let d = &frame.density;
    let mut buf = frame.regions(scratch, task.load_p);

    for i_m in 0..dim_m {
        for i_n in 0..dim_n {
            let imn = i_m * dim_n + i_n;
            let v_pq = coef.pq * d.mn[imn];
            let mut j_mn = 0.0;
            for i_p in 0..dim_p {
                let inp = i_n * dim_p + i_p;
                let imp = i_m * dim_p + i_p;
                let v_mq = coef.mq * d.np[inp];
                let v_nq = coef.nq * d.mp[imp];

                let ints = &integrals[dim_q * (i_p + dim_p * imn)..][..dim_q];
                let d_pq = &d.pq[i_p * dim_q..][..dim_q];
                let d_nq = &d.nq[i_n * dim_q..][..dim_q];
                let d_mq = &d.mq[i_m * dim_q..][..dim_q];
                let j_pq = &mut buf.j_pq[i_p * dim_q..][..dim_q];
                let k_mq = &mut buf.k_mq[i_m * dim_q..][..dim_q];
                let k_nq = &mut buf.k_nq[i_n * dim_q..][..dim_q];

                // Short trip count: a vectorized reduction costs more than it saves.
                let mut k_mp = 0.0;
                let mut k_np = 0.0;
                for i_q in 0..dim_q {
                    let value = ints[i_q];
                    j_mn += d_pq[i_q] * value;
                    k_mp -= d_nq[i_q] * value;
                    k_np -= d_mq[i_q] * value;
                    j_pq[i_q] += v_pq * value;
                    k_mq[i_q] -= v_mq * value;
                    k_nq[i_q] -= v_nq * value;
                }
                buf.k_mp[imp] += k_mp * coef.mp;
                buf.k_np[inp] += k_np * coef.np;
            }
            buf.j_mn[imn] += j_mn * coef.mn;
        }
    }

    update_global_vectors(task.write_p, &frame.dst, &buf);
}

/// Q = 1 variant: the Q loop has a single iteration and is folded into the
/// P loop. K_MQ and K_NQ are reduced over P in registers.
#[inline(always)]
pub(crate) fn contract_q1(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    let frame = Frame::new(ctx, task, integrals, 1);
    let QuartetDims {
        m: dim_m,
        n: dim_n,
        p: dim_p,
        ..
    } = frame.dims;
    let coef = frame.coef;
    let d = &frame.density;
    let mut buf = frame.regions(scratch, task.load_p);

    for i_m in 0..dim_m {
        let d_mq = d.mq[i_m];
        for i_n in 0..dim_n {
            let imn = i_m * dim_n + i_n;
            let inp_base = i_n * dim_p;
            let imp_base = i_m * dim_p;
            let v_pq = coef.pq * d.mn[imn];
            let d_nq = d.nq[i_n];
            let ints = &integrals[imn * dim_p..][..dim_p];

            let mut j_mn = 0.0;
            let mut k_mq = 0.0;
            let mut k_nq = 0.0;
            for i_p in 0..dim_p {
                let v_mq = coef.mq * d.np[inp_base + i_p];
                let v_nq = coef.nq * d.mp[imp_base + i_p];
                let value = ints[i_p];

                j_mn += value * d.pq[i_p];
                k_mq -= v_mq * value;
                k_nq -= v_nq * value;
                buf.j_pq[i_p] += v_pq * value;
                buf.k_mp[imp_base + i_p] -= value * d_nq * coef.mp;
                buf.k_np[inp_base + i_p] -= value * d_mq * coef.np;
            }
            buf.j_mn[imn] += j_mn * coef.mn;
            buf.k_mq[i_m] += k_mq;
            buf.k_nq[i_n] += k_nq;
        }
    }

    update_global_vectors(task.write_p, &frame.dst, &buf);
}
