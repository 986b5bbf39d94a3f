use crate::layout::BlockLayout;
use crate::quartet::ShellQuartet;
use nalgebra::DMatrix;

/// Producer of two-electron integral blocks.
///
/// Implementations fill `out` with `(MN|PQ)` for the quartet, row-major with
/// the Q index fastest, `dimM * dimN * dimP * dimQ` values.
pub trait IntegralSource: Sync {
    fn fill(&self, layout: &BlockLayout, shells: ShellQuartet, out: &mut [f64]);
}

/// Deterministic integrals with the full eightfold permutational symmetry of
/// real two-electron integrals.
///
/// `(ij|kl) = a_ij a_kl + c exp(-w (s_ij - s_kl)²)` with symmetric `a` and
/// `s`. Not physical, but every symmetry the kernels rely on holds exactly.
#[derive(Debug, Clone)]
pub struct ModelIntegrals {
    pub coupling: f64,
    pub width: f64,
}

impl Default for ModelIntegrals {
    fn default() -> Self {
        Self {
            coupling: 0.1,
            width: 0.05,
        }
    }
}

impl ModelIntegrals {
    fn pair_amplitude(i: usize, j: usize) -> f64 {
        (1.0 + 0.1 * ((i * j) as f64).cos()) / (1.0 + 0.15 * (i + j) as f64)
    }

    fn pair_position(i: usize, j: usize) -> f64 {
        (i * i + j * j) as f64 * 0.1
    }

    /// `(ij|kl)` over basis-function indices.
    pub fn value(&self, i: usize, j: usize, k: usize, l: usize) -> f64 {
        let distance = Self::pair_position(i, j) - Self::pair_position(k, l);
        Self::pair_amplitude(i, j) * Self::pair_amplitude(k, l)
            + self.coupling * (-self.width * distance * distance).exp()
    }
}

impl IntegralSource for ModelIntegrals {
    fn fill(&self, layout: &BlockLayout, shells: ShellQuartet, out: &mut [f64]) {
        let ShellQuartet { m, n, p, q } = shells;
        let (m0, n0, p0, q0) = (
            layout.shell_start(m),
            layout.shell_start(n),
            layout.shell_start(p),
            layout.shell_start(q),
        );
        let (dm, dn, dp, dq) = (
            layout.shell_dim(m),
            layout.shell_dim(n),
            layout.shell_dim(p),
            layout.shell_dim(q),
        );
        assert_eq!(out.len(), dm * dn * dp * dq);

        let mut idx = 0;
        for i in m0..m0 + dm {
            for j in n0..n0 + dn {
                for k in p0..p0 + dp {
                    for l in q0..q0 + dq {
                        out[idx] = self.value(i, j, k, l);
                        idx += 1;
                    }
                }
            }
        }
    }
}

/// Symmetric density-like matrix decaying away from the diagonal.
pub fn model_density(nbf: usize) -> DMatrix<f64> {
    DMatrix::from_fn(nbf, nbf, |i, j| {
        let offset = (i as f64 - j as f64).abs();
        0.5 * (-0.3 * offset).exp() * (1.0 + 0.1 * ((i + j) as f64).cos())
    })
}
