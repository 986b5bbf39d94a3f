use super::{KernelContext, QuartetTask};
use crate::atomic::atomic_add_f64;
use crate::scratch::ThreadScratch;

/// Kernel for a quartet of four single-function shells.
///
/// No loops: each of the six contributions is one product. J_MN goes to the
/// scratch accumulator and J_PQ is added atomically. K_MQ and K_NQ are added
/// in place without atomics since their bands belong to this worker.
///
/// K_MP and K_NP still pass through the P-band scratch, as other kernels of
/// the same P run may have staged partial sums there.
pub fn update_fock_1111(
    ctx: &KernelContext<'_>,
    scratch: &mut ThreadScratch,
    task: &QuartetTask,
    integrals: &[f64],
) {
    let dims = ctx.dims(task.shells);
    assert!(dims.is_unit(), "unit kernel called on quartet {:?}", dims);

    let value = integrals[0];
    let c = task.flags.coefficients();
    let d = ctx.density_blocks(task.shells);
    let dst = ctx.destinations(task.shells);

    let v_mn = c.mn * d.pq[0] * value;
    let v_pq = c.pq * d.mn[0] * value;
    let v_mp = c.mp * d.nq[0] * value;
    let v_np = c.np * d.mq[0] * value;
    let v_mq = c.mq * d.np[0] * value;
    let v_nq = c.nq * d.mp[0] * value;

    let mut buf = scratch.regions(dims);
    if task.load_p {
        buf.clear_p_bands();
    }
    buf.j_mn[0] += v_mn;
    buf.k_mp[0] -= v_mp;
    buf.k_np[0] -= v_np;

    atomic_add_f64(&dst.j_pq[0], v_pq);
    dst.k_mq[0].add_exclusive(-v_mq);
    dst.k_nq[0].add_exclusive(-v_nq);
    if task.write_p {
        dst.k_mp[0].add_exclusive(buf.k_mp[0]);
        dst.k_np[0].add_exclusive(buf.k_np[0]);
    }
}
