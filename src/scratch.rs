//! Per-worker scratch arena for the contraction kernels
//!
//! Each worker owns one [`ThreadScratch`] for its whole lifetime and hands it
//! to every kernel call. The arena is carved into six regions per call, laid
//! out back to back:
//!
//! ```text
//! | J_MN | K_MP | K_NP | J_PQ | K_NQ | K_MQ |
//! ```
//!
//! J_MN is an accumulator the caller drains once per (M, N) pair; the kernels
//! only ever add into it. K_MP and K_NP survive between calls that share the
//! same P and are zeroed on `load_p`. The remaining three are rebuilt on
//! every call.

use crate::quartet::QuartetDims;

/// The six scratch regions of one kernel call.
pub struct ScratchRegions<'a> {
    pub j_mn: &'a mut [f64],
    pub k_mp: &'a mut [f64],
    pub k_np: &'a mut [f64],
    pub j_pq: &'a mut [f64],
    pub k_nq: &'a mut [f64],
    pub k_mq: &'a mut [f64],
}

impl ScratchRegions<'_> {
    /// Zeroes K_MP and K_NP, the regions carried across one P.
    pub fn clear_p_bands(&mut self) {
        self.k_mp.fill(0.0);
        self.k_np.fill(0.0);
    }

    /// Zeroes J_PQ, K_NQ and K_MQ.
    pub fn clear_q_bands(&mut self) {
        self.j_pq.fill(0.0);
        self.k_nq.fill(0.0);
        self.k_mq.fill(0.0);
    }
}

/// Thread-local scratch buffer with a fixed capacity.
#[derive(Debug, Clone)]
pub struct ThreadScratch {
    buf: Vec<f64>,
}

impl ThreadScratch {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0.0; capacity],
        }
    }

    /// Arena large enough for any quartet whose shells are at most `max_dim`.
    pub fn for_max_dim(max_dim: usize) -> Self {
        Self::new(scratch_capacity_for(max_dim))
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of doubles one call with these dimensions needs.
    pub fn required_len(dims: QuartetDims) -> usize {
        let QuartetDims { m, n, p, q } = dims;
        (p + n + m) * q + (n + m) * p + m * n
    }

    /// Splits the arena into the six regions for `dims`.
    ///
    /// # Panics
    ///
    /// Panics if the arena is smaller than [`Self::required_len`]. That is a
    /// sizing bug in the caller, not something to recover from.
    pub fn regions(&mut self, dims: QuartetDims) -> ScratchRegions<'_> {
        let required = Self::required_len(dims);
        assert!(
            required <= self.buf.len(),
            "scratch arena too small: quartet {:?} needs {} doubles, capacity is {}",
            dims,
            required,
            self.buf.len()
        );

        let QuartetDims { m, n, p, q } = dims;
        let (j_mn, rest) = self.buf[..required].split_at_mut(m * n);
        let (k_mp, rest) = rest.split_at_mut(m * p);
        let (k_np, rest) = rest.split_at_mut(n * p);
        let (j_pq, rest) = rest.split_at_mut(p * q);
        let (k_nq, k_mq) = rest.split_at_mut(n * q);

        ScratchRegions {
            j_mn,
            k_mp,
            k_np,
            j_pq,
            k_nq,
            k_mq,
        }
    }

    /// The J_MN accumulator of an (M, N) pair with `len = dimM * dimN`.
    pub fn j_mn(&self, len: usize) -> &[f64] {
        &self.buf[..len]
    }

    /// Zeroes the J_MN accumulator before a new (M, N) pair.
    pub fn reset_j_mn(&mut self, len: usize) {
        self.buf[..len].fill(0.0);
    }

    /// Overwrites the whole arena.
    pub fn fill(&mut self, value: f64) {
        self.buf.fill(value);
    }
}

/// Capacity covering every quartet whose shells are at most `max_dim`:
/// `3d·d + 2d·d + d·d`.
pub fn scratch_capacity_for(max_dim: usize) -> usize {
    6 * max_dim * max_dim
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_len() {
        assert_eq!(ThreadScratch::required_len(QuartetDims::new(1, 1, 1, 1)), 6);
        // (6 + 3 + 1) * 10 + (3 + 1) * 6 + 1 * 3
        assert_eq!(
            ThreadScratch::required_len(QuartetDims::new(1, 3, 6, 10)),
            127
        );
        assert_eq!(
            ThreadScratch::required_len(QuartetDims::new(15, 15, 15, 15)),
            scratch_capacity_for(15)
        );
    }

    #[test]
    fn test_regions_are_laid_out_in_order() {
        let dims = QuartetDims::new(2, 3, 4, 5);
        let mut scratch = ThreadScratch::new(100);
        {
            let regions = scratch.regions(dims);
            assert_eq!(regions.j_mn.len(), 6);
            assert_eq!(regions.k_mp.len(), 8);
            assert_eq!(regions.k_np.len(), 12);
            assert_eq!(regions.j_pq.len(), 20);
            assert_eq!(regions.k_nq.len(), 15);
            assert_eq!(regions.k_mq.len(), 10);

            regions.j_mn.fill(1.0);
            regions.k_mp.fill(2.0);
            regions.k_np.fill(3.0);
            regions.j_pq.fill(4.0);
            regions.k_nq.fill(5.0);
            regions.k_mq.fill(6.0);
        }

        let expected: Vec<f64> = [(6, 1.0), (8, 2.0), (12, 3.0), (20, 4.0), (15, 5.0), (10, 6.0)]
            .iter()
            .flat_map(|&(len, v)| std::iter::repeat(v).take(len))
            .chain(std::iter::repeat(0.0).take(100 - 71))
            .collect();
        assert_eq!(scratch.buf, expected);
    }

    #[test]
    fn test_clear_helpers() {
        let dims = QuartetDims::new(1, 1, 3, 3);
        let mut scratch = ThreadScratch::new(ThreadScratch::required_len(dims));
        scratch.fill(7.0);

        let mut regions = scratch.regions(dims);
        regions.clear_q_bands();
        assert!(regions.j_pq.iter().chain(regions.k_nq.iter()).chain(regions.k_mq.iter()).all(|&v| v == 0.0));
        assert!(regions.k_mp.iter().all(|&v| v == 7.0));
        regions.clear_p_bands();
        assert!(regions.k_mp.iter().chain(regions.k_np.iter()).all(|&v| v == 0.0));
        assert_eq!(regions.j_mn[0], 7.0);

        scratch.reset_j_mn(1);
        assert_eq!(scratch.j_mn(1), &[0.0]);
    }

    #[test]
    #[should_panic(expected = "scratch arena too small")]
    fn test_regions_capacity_violation_panics() {
        let mut scratch = ThreadScratch::for_max_dim(3);
        let _ = scratch.regions(QuartetDims::new(6, 3, 3, 3));
    }
}
