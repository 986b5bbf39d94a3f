//! Input/Output operations for Fock build runs
//!
//! This module handles logging setup and result dumps.

mod output;

pub use output::{setup_output, write_matrix};
