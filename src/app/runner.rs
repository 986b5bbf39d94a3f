use super::system::SyntheticSystem;
use crate::config::Config;
use color_eyre::eyre::{ensure, Result, WrapErr};
use fock_kernel::{reference_two_electron, scratch_capacity_for, FockBuilder};
use nalgebra::DMatrix;
use rayon::ThreadPoolBuilder;
use std::time::Duration;
use tracing::info;

/// Largest accepted deviation from the reference build
const VERIFY_TOLERANCE: f64 = 1e-8;

pub struct RunSummary {
    pub matrix: DMatrix<f64>,
    pub quartets: usize,
    pub timings: Vec<Duration>,
    pub threads: usize,
    pub max_deviation: Option<f64>,
}

pub fn run_builds(system: &SyntheticSystem, config: &Config) -> Result<RunSummary> {
    let layout = &system.layout;
    let capacity = config
        .run_params
        .scratch_capacity
        .unwrap_or_else(|| scratch_capacity_for(layout.max_dim()));
    let required = scratch_capacity_for(layout.max_dim());
    ensure!(
        capacity >= required,
        "Scratch capacity {} is below the {} doubles the largest shell needs",
        capacity,
        required
    );

    let pool = ThreadPoolBuilder::new()
        .num_threads(config.threads())
        .build()
        .wrap_err("Failed to build worker pool")?;
    let threads = pool.current_num_threads();
    info!(
        "Running {} build(s) on {} threads, scratch {} doubles, specialized kernels: {}",
        config.repeat(),
        threads,
        capacity,
        config.is_specialize_enabled()
    );

    let builder = FockBuilder::new(layout, &system.integrals)
        .with_scratch_capacity(capacity)
        .with_specialized_kernels(config.is_specialize_enabled());

    let mut result = pool.install(|| builder.build(&system.density));
    let mut timings = vec![result.elapsed];
    for _ in 1..config.repeat() {
        result = pool.install(|| builder.build(&system.density));
        timings.push(result.elapsed);
    }

    let max_deviation = if config.is_verify_enabled() {
        info!("Computing reference two-electron matrix...");
        let reference = reference_two_electron(layout, &system.integrals, &system.density);
        let deviation = (&result.matrix - &reference).abs().max();
        ensure!(
            deviation <= VERIFY_TOLERANCE,
            "Build deviates from the reference by {:e}",
            deviation
        );
        Some(deviation)
    } else {
        None
    };

    Ok(RunSummary {
        matrix: result.matrix,
        quartets: result.quartets,
        timings,
        threads,
        max_deviation,
    })
}
