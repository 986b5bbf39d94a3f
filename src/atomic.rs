//! Lock-free accumulation on `f64` values
//!
//! Rust has no native atomic float type, so the value is stored as its bit
//! pattern in an [`AtomicU64`] and additions go through a compare-and-swap
//! retry loop.

use std::sync::atomic::{AtomicU64, Ordering};

/// An `f64` cell that can be shared between threads
#[derive(Debug)]
#[repr(transparent)]
pub struct AtomicF64 {
    bits: AtomicU64,
}

impl AtomicF64 {
    #[inline]
    pub fn new(value: f64) -> Self {
        Self {
            bits: AtomicU64::new(value.to_bits()),
        }
    }

    #[inline]
    pub fn load(&self, ordering: Ordering) -> f64 {
        f64::from_bits(self.bits.load(ordering))
    }

    #[inline]
    pub fn store(&self, value: f64, ordering: Ordering) {
        self.bits.store(value.to_bits(), ordering);
    }

    /// Atomically adds `addend` and returns the previous value.
    ///
    /// Retries until no other thread has modified the cell between the read
    /// and the swap. There is no bound on the number of retries.
    #[inline]
    pub fn fetch_add(&self, addend: f64, ordering: Ordering) -> f64 {
        let mut current = self.bits.load(Ordering::Relaxed);
        loop {
            let new = (f64::from_bits(current) + addend).to_bits();
            match self
                .bits
                .compare_exchange_weak(current, new, ordering, Ordering::Relaxed)
            {
                Ok(previous) => return f64::from_bits(previous),
                Err(actual) => current = actual,
            }
        }
    }

    /// Plain read-modify-write without a CAS.
    ///
    /// Only correct while the caller is the single writer of this cell; a
    /// concurrent writer makes one of the two updates disappear.
    #[inline]
    pub fn add_exclusive(&self, addend: f64) {
        let value = self.load(Ordering::Relaxed);
        self.store(value + addend, Ordering::Relaxed);
    }

    pub fn into_inner(self) -> f64 {
        f64::from_bits(self.bits.into_inner())
    }
}

impl Default for AtomicF64 {
    #[inline]
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl Clone for AtomicF64 {
    fn clone(&self) -> Self {
        Self::new(self.load(Ordering::Relaxed))
    }
}

/// `*target += addend`, safe against concurrent callers on the same cell.
#[inline]
pub fn atomic_add_f64(target: &AtomicF64, addend: f64) {
    target.fetch_add(addend, Ordering::Relaxed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fetch_add_returns_previous() {
        let cell = AtomicF64::new(1.5);
        let previous = cell.fetch_add(2.0, Ordering::Relaxed);
        assert_eq!(previous, 1.5);
        assert_eq!(cell.load(Ordering::Relaxed), 3.5);
    }

    #[test]
    fn test_add_exclusive_single_writer() {
        let cell = AtomicF64::default();
        for _ in 0..10 {
            cell.add_exclusive(0.5);
        }
        assert_eq!(cell.into_inner(), 5.0);
    }

    #[test]
    fn test_atomic_add_under_contention() {
        const THREADS: usize = 8;
        const ADDS: usize = 100_000;

        let cell = AtomicF64::default();
        thread::scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|| {
                    for _ in 0..ADDS {
                        atomic_add_f64(&cell, 1.0);
                    }
                });
            }
        });

        assert_eq!(cell.load(Ordering::SeqCst), 800_000.0);
    }

    #[test]
    fn test_atomic_add_mixed_addends() {
        // Multiples of 0.25 are exact in binary, so the sum is order independent.
        let cell = AtomicF64::new(-10.0);
        thread::scope(|s| {
            for t in 0..4 {
                let cell = &cell;
                s.spawn(move || {
                    let addend = 0.25 * (t + 1) as f64;
                    for _ in 0..1000 {
                        atomic_add_f64(cell, addend);
                    }
                });
            }
        });

        // 1000 * 0.25 * (1 + 2 + 3 + 4) = 2500
        assert_eq!(cell.into_inner(), 2490.0);
    }
}
