//! Command-line argument parsing for Fock build runs

use clap::Parser;

/// Run the Fock update kernels on a synthetic shell system
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    pub config_file: String,

    /// Override output file: (default stdout)
    #[arg(short, long)]
    pub output: Option<String>,

    /// Override number of worker threads
    #[arg(long)]
    pub threads: Option<usize>,

    /// Override number of Fock builds
    #[arg(long)]
    pub repeat: Option<usize>,

    /// Override per-worker scratch capacity (in doubles)
    #[arg(long)]
    pub scratch_capacity: Option<usize>,

    /// Compare against the naive reference build
    #[arg(long)]
    pub verify: bool,

    /// Use the generic kernel for every quartet
    #[arg(long)]
    pub generic_only: bool,

    /// Write the final two-electron matrix to this file
    #[arg(long)]
    pub dump: Option<String>,
}
