//! Configuration management for Fock build runs
//!
//! This module handles configuration structures, defaults, and validation
//! for the synthetic shell system and the build parameters.

mod args;

pub use args::Args;

use color_eyre::eyre::{bail, ensure, Result};
use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub shells: Vec<ShellSpec>,
    #[serde(default)]
    pub run_params: RunParams,
}

/// A group of identical shells, e.g. `{ kind: p, count: 4 }`
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ShellSpec {
    pub kind: String,
    pub count: Option<usize>,
}

impl ShellSpec {
    /// Number of Cartesian functions of the shell type.
    pub fn dim(&self) -> Result<usize> {
        let dim = match self.kind.to_lowercase().as_str() {
            "s" => 1,
            "p" => 3,
            "d" => 6,
            "f" => 10,
            "g" => 15,
            other => bail!("Unknown shell kind: {}", other),
        };
        Ok(dim)
    }
}

/// Build parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RunParams {
    pub threads: Option<usize>,
    pub repeat: Option<usize>,
    pub scratch_capacity: Option<usize>,
    pub verify: Option<bool>,
    pub specialize: Option<bool>,
}

impl Default for RunParams {
    fn default() -> Self {
        RunParams {
            threads: Some(0),
            repeat: Some(1),
            scratch_capacity: None,
            verify: Some(false),
            specialize: Some(true),
        }
    }
}

impl RunParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.threads.is_none() {
            self.threads = defaults.threads;
        }
        if self.repeat.is_none() {
            self.repeat = defaults.repeat;
        }
        if self.verify.is_none() {
            self.verify = defaults.verify;
        }
        if self.specialize.is_none() {
            self.specialize = defaults.specialize;
        }
        self
    }
}

impl Config {
    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        self.run_params = self.run_params.with_defaults();
        self
    }

    /// Shell dimensions in the order they are listed
    pub fn shell_dims(&self) -> Result<Vec<usize>> {
        let mut dims = Vec::new();
        for spec in &self.shells {
            let count = spec.count.unwrap_or(1);
            ensure!(count > 0, "Shell group '{}' has count 0", spec.kind);
            dims.extend(std::iter::repeat(spec.dim()?).take(count));
        }
        ensure!(!dims.is_empty(), "No shells configured");
        Ok(dims)
    }

    /// Worker threads, 0 meaning one per core
    pub fn threads(&self) -> usize {
        self.run_params.threads.unwrap_or(0)
    }

    pub fn repeat(&self) -> usize {
        self.run_params.repeat.unwrap_or(1).max(1)
    }

    pub fn is_verify_enabled(&self) -> bool {
        self.run_params.verify.unwrap_or(false)
    }

    pub fn is_specialize_enabled(&self) -> bool {
        self.run_params.specialize.unwrap_or(true)
    }

    /// Apply command-line overrides on top of the file values
    pub fn apply_args(mut self, args: &Args) -> Self {
        if let Some(threads) = args.threads {
            self.run_params.threads = Some(threads);
        }
        if let Some(repeat) = args.repeat {
            self.run_params.repeat = Some(repeat);
        }
        if let Some(capacity) = args.scratch_capacity {
            self.run_params.scratch_capacity = Some(capacity);
        }
        if args.verify {
            self.run_params.verify = Some(true);
        }
        if args.generic_only {
            self.run_params.specialize = Some(false);
        }
        self
    }
}
