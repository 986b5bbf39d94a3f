//! Fock-matrix accumulation kernels for shell-quartet based Fock builds

pub mod atomic;
pub mod driver;
pub mod kernel;
pub mod layout;
pub mod quartet;
pub mod scratch;
pub mod update;

pub use atomic::{atomic_add_f64, AtomicF64};
pub use driver::{reference_two_electron, FockBuilder, FockResult, IntegralSource};
pub use kernel::{update_fock, KernelContext, KernelKind, QuartetTask};
pub use layout::{BandView, BlockLayout, ResultBank};
pub use quartet::{Coefficients, QuartetDims, ShellQuartet, SymmetryFlags};
pub use scratch::{scratch_capacity_for, ThreadScratch};
