//! Shell quartets and their permutational symmetry weights

/// Number of basis functions in each shell of a quartet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QuartetDims {
    pub m: usize,
    pub n: usize,
    pub p: usize,
    pub q: usize,
}

impl QuartetDims {
    pub const fn new(m: usize, n: usize, p: usize, q: usize) -> Self {
        Self { m, n, p, q }
    }

    /// Length of the `(MN|PQ)` integral block.
    pub fn integral_len(&self) -> usize {
        self.m * self.n * self.p * self.q
    }

    pub fn is_unit(&self) -> bool {
        self.m == 1 && self.n == 1 && self.p == 1 && self.q == 1
    }
}

/// Shell indices of a quartet `(MN|PQ)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShellQuartet {
    pub m: usize,
    pub n: usize,
    pub p: usize,
    pub q: usize,
}

impl ShellQuartet {
    pub const fn new(m: usize, n: usize, p: usize, q: usize) -> Self {
        Self { m, n, p, q }
    }
}

/// Which permutations of a quartet are distinct integrals.
///
/// A flag is `true` when the corresponding swap yields a *different* quartet,
/// which then has to be counted separately:
///
/// * `flag1`: swapping M and N (`M != N`)
/// * `flag2`: swapping P and Q (`P != Q`)
/// * `flag3`: swapping bra and ket (`(M, N) != (P, Q)`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SymmetryFlags {
    pub flag1: bool,
    pub flag2: bool,
    pub flag3: bool,
}

impl SymmetryFlags {
    pub const fn new(flag1: bool, flag2: bool, flag3: bool) -> Self {
        Self {
            flag1,
            flag2,
            flag3,
        }
    }

    /// Flags of a canonically ordered quartet (`M >= N`, `P >= Q`, `MN >= PQ`).
    pub fn for_quartet(quartet: ShellQuartet) -> Self {
        let ShellQuartet { m, n, p, q } = quartet;
        Self {
            flag1: m != n,
            flag2: p != q,
            flag3: !(m == p && n == q),
        }
    }

    /// All eight flag combinations, `flag1` varying slowest.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..8u8).map(|bits| Self::new(bits & 4 != 0, bits & 2 != 0, bits & 1 != 0))
    }

    /// The six contraction weights for this symmetry class.
    pub fn coefficients(&self) -> Coefficients {
        let f1 = self.flag1 as u8;
        let f2 = self.flag2 as u8;
        let f3 = self.flag3 as u8;
        let f4 = f1 & f2;
        let f5 = f1 & f3;
        let f6 = f2 & f3;
        let f7 = f4 & f3;

        Coefficients {
            pq: 2.0 * f64::from(f3 + f5 + f6 + f7),
            mq: f64::from(f2 + f6),
            nq: f64::from(f4 + f7),
            mn: 2.0 * f64::from(1 + f1 + f2 + f4),
            mp: f64::from(1 + f3),
            np: f64::from(f1 + f5),
        }
    }
}

/// Weights applied to each of the six contractions of one quartet.
///
/// Each weight counts how many symmetry-equivalent index arrangements of the
/// quartet feed the same result block. The Coulomb weights carry the factor 2
/// of the closed-shell two-electron operator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub pq: f64,
    pub mq: f64,
    pub nq: f64,
    pub mn: f64,
    pub mp: f64,
    pub np: f64,
}
