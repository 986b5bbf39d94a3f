//! Accumulation primitives for pushing scratch results into result buffers
//!
//! Two flavours exist for every flat update: a direct one, for destinations
//! the calling worker owns for the duration of the call, and an atomic one,
//! for destinations other workers may be adding into at the same time.
//! Which one is used is decided by [`update_global_vectors`], never by the
//! destination itself.

use crate::atomic::{atomic_add_f64, AtomicF64};
use crate::scratch::ScratchRegions;

/// Adds a dense `nrows × ncols` block into another dense block.
///
/// `ldd` and `lds` are the row strides of `dst` and `src`. No
/// synchronization: `&mut` already makes the destination exclusive.
pub fn direct_add_block(
    dst: &mut [f64],
    ldd: usize,
    src: &[f64],
    lds: usize,
    nrows: usize,
    ncols: usize,
) {
    for irow in 0..nrows {
        let dst_row = &mut dst[irow * ldd..irow * ldd + ncols];
        let src_row = &src[irow * lds..irow * lds + ncols];
        for (d, s) in dst_row.iter_mut().zip(src_row) {
            *d += s;
        }
    }
}

/// `dst[i] += src[i]` for a destination owned by the caller.
///
/// Uses relaxed loads and stores, which compile to plain moves. If another
/// worker writes `dst` during the call, updates are lost silently.
#[inline]
pub fn direct_add_vector(dst: &[AtomicF64], src: &[f64]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, &s) in dst.iter().zip(src) {
        d.add_exclusive(s);
    }
}

/// `dst[i] += src[i]` where every element goes through [`atomic_add_f64`].
#[inline]
pub fn atomic_add_vector(dst: &[AtomicF64], src: &[f64]) {
    debug_assert_eq!(dst.len(), src.len());
    for (d, &s) in dst.iter().zip(src) {
        atomic_add_f64(d, s);
    }
}

/// The five shared blocks one quartet writes to.
pub struct Destinations<'a> {
    pub k_mp: &'a [AtomicF64],
    pub k_np: &'a [AtomicF64],
    pub j_pq: &'a [AtomicF64],
    pub k_mq: &'a [AtomicF64],
    pub k_nq: &'a [AtomicF64],
}

/// Whether J_PQ blocks are private to each worker in this build.
pub const PQ_BUFFER_DUPLICATED: bool = cfg!(feature = "dup-pq-buffer");

/// Pushes one quartet's scratch into the result buffers.
///
/// K_MP and K_NP are only flushed when `write_p` is set, i.e. after the last
/// quartet of the current P. K_MQ and K_NQ live in bands the worker owns and
/// take the direct path. J_PQ is shared and needs atomics unless the
/// `dup-pq-buffer` feature gives every worker its own copy.
pub fn update_global_vectors(write_p: bool, dst: &Destinations<'_>, buf: &ScratchRegions<'_>) {
    if write_p {
        direct_add_vector(dst.k_mp, buf.k_mp);
        direct_add_vector(dst.k_np, buf.k_np);
    }

    if PQ_BUFFER_DUPLICATED {
        direct_add_vector(dst.j_pq, buf.j_pq);
    } else {
        atomic_add_vector(dst.j_pq, buf.j_pq);
    }

    direct_add_vector(dst.k_mq, buf.k_mq);
    direct_add_vector(dst.k_nq, buf.k_nq);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scratch::ThreadScratch;
    use crate::QuartetDims;
    use std::sync::atomic::Ordering;
    use std::thread;

    fn bank(len: usize, value: f64) -> Vec<AtomicF64> {
        (0..len).map(|_| AtomicF64::new(value)).collect()
    }

    fn values(bank: &[AtomicF64]) -> Vec<f64> {
        bank.iter().map(|v| v.load(Ordering::Relaxed)).collect()
    }

    #[test]
    fn test_direct_add_block_strides() {
        // 2x3 source with stride 4 into a 3x5 destination with stride 5
        let src = [1.0, 2.0, 3.0, 99.0, 4.0, 5.0, 6.0, 99.0];
        let mut dst = vec![0.0; 15];
        direct_add_block(&mut dst[6..], 5, &src, 4, 2, 3);

        let expected = [
            0.0, 0.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 2.0, 3.0, 0.0, //
            0.0, 4.0, 5.0, 6.0, 0.0,
        ];
        assert_eq!(dst, expected);
    }

    #[test]
    fn test_direct_and_atomic_vector_agree() {
        let src: Vec<f64> = (0..17).map(|i| i as f64 * 0.5 - 3.0).collect();
        let direct = bank(17, 1.0);
        let atomic = bank(17, 1.0);
        direct_add_vector(&direct, &src);
        atomic_add_vector(&atomic, &src);
        assert_eq!(values(&direct), values(&atomic));
        assert_eq!(values(&direct)[4], 0.0);
    }

    #[test]
    fn test_atomic_add_vector_concurrent() {
        let dst = bank(64, 0.0);
        let src = vec![1.0; 64];
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    for _ in 0..500 {
                        atomic_add_vector(&dst, &src);
                    }
                });
            }
        });
        assert!(values(&dst).iter().all(|&v| v == 4000.0));
    }

    fn filled_scratch(dims: QuartetDims) -> ThreadScratch {
        let mut scratch = ThreadScratch::new(ThreadScratch::required_len(dims));
        scratch.fill(1.0);
        scratch
    }

    #[test]
    fn test_update_skips_p_bands_without_write_p() {
        let dims = QuartetDims::new(1, 3, 3, 1);
        let mut scratch = filled_scratch(dims);
        let regions = scratch.regions(dims);

        let (k_mp, k_np) = (bank(3, 0.0), bank(9, 0.0));
        let (j_pq, k_mq, k_nq) = (bank(3, 0.0), bank(1, 0.0), bank(3, 0.0));
        let dst = Destinations {
            k_mp: &k_mp,
            k_np: &k_np,
            j_pq: &j_pq,
            k_mq: &k_mq,
            k_nq: &k_nq,
        };

        update_global_vectors(false, &dst, &regions);
        assert!(values(&k_mp).iter().all(|&v| v == 0.0));
        assert!(values(&k_np).iter().all(|&v| v == 0.0));
        assert!(values(&j_pq).iter().all(|&v| v == 1.0));
        assert!(values(&k_mq).iter().all(|&v| v == 1.0));
        assert!(values(&k_nq).iter().all(|&v| v == 1.0));

        update_global_vectors(true, &dst, &regions);
        assert!(values(&k_mp).iter().all(|&v| v == 1.0));
        assert!(values(&k_np).iter().all(|&v| v == 1.0));
        assert!(values(&j_pq).iter().all(|&v| v == 2.0));
    }
}
