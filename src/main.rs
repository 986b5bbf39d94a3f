//! Fock Build Command-Line Interface
//!
//! Runs the accumulation kernels on a synthetic shell system described in a
//! YAML configuration.

use color_eyre::eyre::Result;

mod app;
mod config;
mod io;

use app::FockApplication;

fn main() -> Result<()> {
    color_eyre::install()?;
    FockApplication::from_cli()?.run()
}
