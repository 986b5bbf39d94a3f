//! Shell-pair blocked storage for density and Fock matrices
//!
//! A matrix over `nbf` basis functions is stored as `nshells²` dense blocks,
//! one per ordered shell pair `(A, B)`, each `dimA × dimB` row-major. Blocks
//! are ordered row-major by pair, so all blocks of shell A (its *band*) are
//! contiguous.

use crate::atomic::AtomicF64;
use crate::update::direct_add_block;
use color_eyre::eyre::{ensure, Result};
use nalgebra::DMatrix;
use std::sync::atomic::Ordering;

/// Offsets of every shell-pair block inside a blocked matrix.
#[derive(Debug, Clone)]
pub struct BlockLayout {
    shell_dims: Vec<usize>,
    shell_starts: Vec<usize>,
    block_ptr: Vec<usize>,
    total_len: usize,
}

impl BlockLayout {
    pub fn new(shell_dims: &[usize]) -> Result<Self> {
        ensure!(!shell_dims.is_empty(), "layout needs at least one shell");
        ensure!(
            shell_dims.iter().all(|&d| d > 0),
            "shell dimensions must be positive, got {:?}",
            shell_dims
        );

        let nshells = shell_dims.len();
        let mut shell_starts = Vec::with_capacity(nshells);
        let mut start = 0;
        for &dim in shell_dims {
            shell_starts.push(start);
            start += dim;
        }

        let mut block_ptr = Vec::with_capacity(nshells * nshells);
        let mut offset = 0;
        for &dim_a in shell_dims {
            for &dim_b in shell_dims {
                block_ptr.push(offset);
                offset += dim_a * dim_b;
            }
        }

        Ok(Self {
            shell_dims: shell_dims.to_vec(),
            shell_starts,
            block_ptr,
            total_len: offset,
        })
    }

    pub fn nshells(&self) -> usize {
        self.shell_dims.len()
    }

    /// Number of basis functions.
    pub fn nbf(&self) -> usize {
        self.shell_dims.iter().sum()
    }

    pub fn shell_dim(&self, shell: usize) -> usize {
        self.shell_dims[shell]
    }

    /// First basis function of `shell`.
    pub fn shell_start(&self, shell: usize) -> usize {
        self.shell_starts[shell]
    }

    pub fn max_dim(&self) -> usize {
        self.shell_dims.iter().copied().max().unwrap_or(0)
    }

    /// Length of a whole blocked matrix.
    pub fn total_len(&self) -> usize {
        self.total_len
    }

    pub fn block_offset(&self, a: usize, b: usize) -> usize {
        self.block_ptr[a * self.nshells() + b]
    }

    pub fn block_len(&self, a: usize, b: usize) -> usize {
        self.shell_dims[a] * self.shell_dims[b]
    }

    pub fn block_range(&self, a: usize, b: usize) -> std::ops::Range<usize> {
        let offset = self.block_offset(a, b);
        offset..offset + self.block_len(a, b)
    }

    /// Offset of the first block of shell `a`'s band.
    pub fn band_offset(&self, a: usize) -> usize {
        self.block_offset(a, 0)
    }

    /// Length of shell `a`'s band, i.e. `dimA * nbf`.
    pub fn band_len(&self, a: usize) -> usize {
        self.shell_dims[a] * self.nbf()
    }

    /// Copies a dense matrix into blocked storage.
    pub fn to_blocks(&self, matrix: &DMatrix<f64>) -> Vec<f64> {
        assert_eq!(matrix.nrows(), self.nbf());
        assert_eq!(matrix.ncols(), self.nbf());

        let mut blocks = vec![0.0; self.total_len];
        for a in 0..self.nshells() {
            for b in 0..self.nshells() {
                let (ra, rb) = (self.shell_start(a), self.shell_start(b));
                let ncols = self.shell_dim(b);
                let block = &mut blocks[self.block_range(a, b)];
                for (i, row) in block.chunks_exact_mut(ncols).enumerate() {
                    for (j, value) in row.iter_mut().enumerate() {
                        *value = matrix[(ra + i, rb + j)];
                    }
                }
            }
        }
        blocks
    }

    /// Assembles a dense matrix from blocked storage.
    pub fn from_blocks(&self, blocks: &[f64]) -> DMatrix<f64> {
        assert_eq!(blocks.len(), self.total_len);

        let nbf = self.nbf();
        let mut dense = vec![0.0; nbf * nbf];
        for a in 0..self.nshells() {
            for b in 0..self.nshells() {
                let corner = self.shell_start(a) * nbf + self.shell_start(b);
                let (nrows, ncols) = (self.shell_dim(a), self.shell_dim(b));
                let block = &blocks[self.block_range(a, b)];
                direct_add_block(&mut dense[corner..], nbf, block, ncols, nrows, ncols);
            }
        }
        DMatrix::from_row_slice(nbf, nbf, &dense)
    }
}

/// Blocked result matrix that several workers may add into at once.
#[derive(Debug, Clone)]
pub struct ResultBank {
    data: Vec<AtomicF64>,
}

impl ResultBank {
    pub fn zeros(len: usize) -> Self {
        Self {
            data: (0..len).map(|_| AtomicF64::default()).collect(),
        }
    }

    pub fn for_layout(layout: &BlockLayout) -> Self {
        Self::zeros(layout.total_len())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[AtomicF64] {
        &self.data
    }

    /// View over the whole bank, addressed by absolute block offsets.
    pub fn whole(&self) -> BandView<'_> {
        BandView::new(&self.data, 0)
    }

    /// View over the band of shell `a`.
    pub fn band(&self, layout: &BlockLayout, a: usize) -> BandView<'_> {
        let base = layout.band_offset(a);
        BandView::new(&self.data[base..base + layout.band_len(a)], base)
    }

    pub fn to_vec(&self) -> Vec<f64> {
        self.data.iter().map(|v| v.load(Ordering::Relaxed)).collect()
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data.into_iter().map(AtomicF64::into_inner).collect()
    }
}

/// A window of result storage starting at absolute offset `base`.
///
/// Blocks are looked up with the same absolute offsets as the layout hands
/// out; the view subtracts its base.
#[derive(Debug, Clone, Copy)]
pub struct BandView<'a> {
    data: &'a [AtomicF64],
    base: usize,
}

impl<'a> BandView<'a> {
    pub fn new(data: &'a [AtomicF64], base: usize) -> Self {
        Self { data, base }
    }

    pub fn base(&self) -> usize {
        self.base
    }

    /// The block at absolute `offset` with `len` elements.
    ///
    /// # Panics
    ///
    /// Panics if the block does not lie inside this view.
    #[inline]
    pub fn block(&self, offset: usize, len: usize) -> &'a [AtomicF64] {
        debug_assert!(
            offset >= self.base && offset - self.base + len <= self.data.len(),
            "block {}..{} outside of view {}..{}",
            offset,
            offset + len,
            self.base,
            self.base + self.data.len()
        );
        let start = offset - self.base;
        &self.data[start..start + len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_offsets_and_bands() {
        let layout = BlockLayout::new(&[1, 3, 6]).unwrap();
        assert_eq!(layout.nshells(), 3);
        assert_eq!(layout.nbf(), 10);
        assert_eq!(layout.total_len(), 100);
        assert_eq!(layout.max_dim(), 6);

        assert_eq!(layout.block_offset(0, 0), 0);
        assert_eq!(layout.block_offset(0, 1), 1);
        assert_eq!(layout.block_offset(0, 2), 4);
        assert_eq!(layout.block_offset(1, 0), 10);
        assert_eq!(layout.block_offset(1, 2), 10 + 3 + 9);
        assert_eq!(layout.block_offset(2, 0), 40);
        assert_eq!(layout.block_len(2, 1), 18);

        assert_eq!(layout.band_offset(1), 10);
        assert_eq!(layout.band_len(1), 30);
        assert_eq!(layout.band_offset(2) + layout.band_len(2), layout.total_len());
        assert_eq!(layout.shell_start(2), 4);
    }

    #[test]
    fn test_invalid_layouts_are_rejected() {
        assert!(BlockLayout::new(&[]).is_err());
        assert!(BlockLayout::new(&[1, 0, 3]).is_err());
    }

    #[test]
    fn test_dense_blocked_conversion() {
        let layout = BlockLayout::new(&[3, 1, 3]).unwrap();
        let dense = DMatrix::from_fn(7, 7, |i, j| (10 * i + j) as f64);
        let blocks = layout.to_blocks(&dense);

        // block (0, 2) starts at row 0, column 4
        let b02 = &blocks[layout.block_range(0, 2)];
        assert_eq!(b02, &[4.0, 5.0, 6.0, 14.0, 15.0, 16.0, 24.0, 25.0, 26.0]);
        assert_eq!(blocks[layout.block_offset(1, 1)], 33.0);

        assert_eq!(layout.from_blocks(&blocks), dense);
    }

    #[test]
    fn test_band_view_addresses_by_absolute_offset() {
        let layout = BlockLayout::new(&[1, 3]).unwrap();
        let bank = ResultBank::for_layout(&layout);
        let band = bank.band(&layout, 1);
        assert_eq!(band.base(), 4);

        let block = band.block(layout.block_offset(1, 1), layout.block_len(1, 1));
        assert_eq!(block.len(), 9);
        block[0].add_exclusive(2.0);

        let whole = bank.whole();
        let same = whole.block(layout.block_offset(1, 1), 9);
        assert_eq!(same[0].load(Ordering::Relaxed), 2.0);
        assert_eq!(bank.to_vec()[7], 2.0);
    }

    #[test]
    #[should_panic]
    fn test_band_view_rejects_foreign_block() {
        let layout = BlockLayout::new(&[1, 3]).unwrap();
        let bank = ResultBank::for_layout(&layout);
        let band = bank.band(&layout, 1);
        let _ = band.block(layout.block_offset(0, 1), 3);
    }
}
