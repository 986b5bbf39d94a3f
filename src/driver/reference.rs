use super::IntegralSource;
use crate::layout::BlockLayout;
use crate::quartet::ShellQuartet;
use nalgebra::DMatrix;

/// Two-electron part of the closed-shell Fock matrix without any symmetry
/// tricks: `G_mn = Σ_pq D_pq [2 (mn|pq) - (mp|nq)]`.
///
/// Visits every ordered shell quartet, so it is `O(nbf⁴)` and only meant for
/// checking the kernels on small systems.
pub fn reference_two_electron<S: IntegralSource>(
    layout: &BlockLayout,
    source: &S,
    density: &DMatrix<f64>,
) -> DMatrix<f64> {
    let nbf = layout.nbf();
    let nshells = layout.nshells();
    let mut g = DMatrix::zeros(nbf, nbf);
    let mut block = Vec::new();

    for m in 0..nshells {
        for n in 0..nshells {
            for p in 0..nshells {
                for q in 0..nshells {
                    let shells = ShellQuartet::new(m, n, p, q);
                    let dims = [m, n, p, q].map(|s| layout.shell_dim(s));
                    let starts = [m, n, p, q].map(|s| layout.shell_start(s));
                    block.resize(dims.iter().product(), 0.0);
                    source.fill(layout, shells, &mut block);

                    let mut idx = 0;
                    for i in starts[0]..starts[0] + dims[0] {
                        for j in starts[1]..starts[1] + dims[1] {
                            for k in starts[2]..starts[2] + dims[2] {
                                for l in starts[3]..starts[3] + dims[3] {
                                    let value = block[idx];
                                    idx += 1;
                                    g[(i, j)] += 2.0 * density[(k, l)] * value;
                                    g[(i, k)] -= density[(j, l)] * value;
                                }
                            }
                        }
                    }
                }
            }
        }
    }
    g
}
