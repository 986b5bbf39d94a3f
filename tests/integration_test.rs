//! End-to-end tests driving the Fock kernels through the public API
//!
//! These build full two-electron matrices and compare them against the
//! naive reference or closed-form values.

use fock_kernel::driver::{model_density, ModelIntegrals};
use fock_kernel::update::{atomic_add_vector, direct_add_vector, PQ_BUFFER_DUPLICATED};
use fock_kernel::{
    reference_two_electron, update_fock, BlockLayout, FockBuilder, IntegralSource,
    KernelContext, KernelKind, QuartetTask, ResultBank, ShellQuartet, SymmetryFlags,
    ThreadScratch,
};
use nalgebra::DMatrix;

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Every integral equals one.
    struct ConstantIntegrals;

    impl IntegralSource for ConstantIntegrals {
        fn fill(&self, _layout: &BlockLayout, _shells: ShellQuartet, out: &mut [f64]) {
            out.fill(1.0);
        }
    }

    fn max_abs_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
        (a - b).abs().max()
    }

    /// `(load_p, write_p)` for the `q`-th quartet of a P run ending at `q_last`.
    fn canonical_schedule(q: usize, q_last: usize) -> (bool, bool) {
        (q == 0, q == q_last)
    }

    /// Sequential Fock build written against the kernel entry points only.
    fn build_by_hand<S: IntegralSource>(
        layout: &BlockLayout,
        source: &S,
        density: &DMatrix<f64>,
        schedule: impl Fn(usize, usize) -> (bool, bool),
    ) -> DMatrix<f64> {
        let density_blocks = layout.to_blocks(density);
        let bank = ResultBank::for_layout(layout);
        let mut scratch = ThreadScratch::for_max_dim(layout.max_dim());
        let mut integrals = Vec::new();

        for m in 0..layout.nshells() {
            for n in 0..=m {
                let ctx = KernelContext {
                    layout,
                    density: &density_blocks,
                    m_band: bank.band(layout, m),
                    n_band: bank.band(layout, n),
                    pq_blocks: bank.whole(),
                };
                let mn_len = layout.block_len(m, n);
                scratch.reset_j_mn(mn_len);

                for p in 0..=m {
                    let q_last = if p == m { n } else { p };
                    for q in 0..=q_last {
                        let shells = ShellQuartet::new(m, n, p, q);
                        let dims = ctx.dims(shells);
                        integrals.resize(dims.integral_len(), 0.0);
                        source.fill(layout, shells, &mut integrals);

                        let (load_p, write_p) = schedule(q, q_last);
                        let task = QuartetTask {
                            shells,
                            flags: SymmetryFlags::for_quartet(shells),
                            load_p,
                            write_p,
                        };
                        update_fock(KernelKind::select(dims), &ctx, &mut scratch, &task, &integrals);
                    }
                }

                let j_mn = ctx.m_band.block(layout.block_offset(m, n), mn_len);
                direct_add_vector(j_mn, scratch.j_mn(mn_len));
            }
        }

        let g = layout.from_blocks(&bank.into_vec());
        (&g + g.transpose()) * 0.5
    }

    #[test]
    fn test_constant_integrals_give_density_sum() {
        // G_mn = sum_pq D_pq (2 - 1) when every integral is one
        let layout = BlockLayout::new(&[1, 3, 6, 1]).unwrap();
        let density = model_density(layout.nbf());
        let expected = density.sum();

        let result = FockBuilder::new(&layout, &ConstantIntegrals).build(&density);
        for value in result.matrix.iter() {
            assert!(
                (value - expected).abs() < 1e-10 * expected.abs().max(1.0),
                "{} != {}",
                value,
                expected
            );
        }
    }

    #[test]
    fn test_hand_driven_kernels_match_reference() {
        let layout = BlockLayout::new(&[3, 1, 10, 6, 1, 15]).unwrap();
        let source = ModelIntegrals::default();
        let density = model_density(layout.nbf());

        let by_hand = build_by_hand(&layout, &source, &density, canonical_schedule);
        let reference = reference_two_electron(&layout, &source, &density);
        assert!(max_abs_diff(&by_hand, &reference) < 1e-10);
    }

    #[test]
    fn test_parallel_build_matches_hand_driven_build() {
        let layout = BlockLayout::new(&[1, 1, 3, 3, 6, 10]).unwrap();
        let source = ModelIntegrals {
            coupling: 0.3,
            width: 0.2,
        };
        let density = model_density(layout.nbf());

        let parallel = FockBuilder::new(&layout, &source).build(&density);
        let by_hand = build_by_hand(&layout, &source, &density, canonical_schedule);
        assert!(max_abs_diff(&parallel.matrix, &by_hand) < 1e-10);
    }

    #[test]
    fn test_load_and_write_flags_are_load_bearing() {
        let layout = BlockLayout::new(&[3, 1, 3]).unwrap();
        let source = ModelIntegrals::default();
        let density = model_density(layout.nbf());
        let reference = reference_two_electron(&layout, &source, &density);

        let canonical = build_by_hand(&layout, &source, &density, canonical_schedule);
        assert!(max_abs_diff(&canonical, &reference) < 1e-10);

        // K_MP / K_NP never flushed
        let never_written = build_by_hand(&layout, &source, &density, |q, _| (q == 0, false));
        assert!(max_abs_diff(&never_written, &reference) > 1e-3);

        // flushed after every quartet but only cleared at the start of P
        let flushed_early = build_by_hand(&layout, &source, &density, |q, _| (q == 0, true));
        assert!(max_abs_diff(&flushed_early, &reference) > 1e-3);

        // flushing every quartet is fine as long as scratch restarts each time
        let one_by_one = build_by_hand(&layout, &source, &density, |_, _| (true, true));
        assert!(max_abs_diff(&one_by_one, &reference) < 1e-10);
    }

    #[test]
    fn test_result_is_linear_in_density() {
        let layout = BlockLayout::new(&[3, 6, 1]).unwrap();
        let source = ModelIntegrals::default();
        let density = model_density(layout.nbf());
        let builder = FockBuilder::new(&layout, &source);

        let single = builder.build(&density).matrix;
        let doubled = builder.build(&(&density * 2.0)).matrix;
        assert!(max_abs_diff(&(single * 2.0), &doubled) < 1e-10);
    }

    #[test]
    fn test_concurrent_vector_accumulation() {
        let bank = ResultBank::zeros(64);
        let ones = vec![1.0; 64];
        let threads = 8;
        let rounds = 500;

        std::thread::scope(|s| {
            for _ in 0..threads {
                s.spawn(|| {
                    for _ in 0..rounds {
                        atomic_add_vector(bank.as_slice(), &ones);
                    }
                });
            }
        });

        let expected = (threads * rounds) as f64;
        assert!(bank.into_vec().iter().all(|&v| v == expected));
    }

    #[test]
    fn test_pq_buffer_mode_matches_feature() {
        assert_eq!(PQ_BUFFER_DUPLICATED, cfg!(feature = "dup-pq-buffer"));
    }
}
