use super::runner::RunSummary;
use super::system::SyntheticSystem;
use fock_kernel::update::PQ_BUFFER_DUPLICATED;
use std::time::Duration;
use tracing::info;

pub fn report_summary(system: &SyntheticSystem, summary: &RunSummary) {
    info!("\nFock build finished.");
    info!("  Shell quartets per build: {}", summary.quartets);
    info!("  Worker threads: {}", summary.threads);
    info!(
        "  J_PQ updates: {}",
        if PQ_BUFFER_DUPLICATED {
            "direct (duplicated buffers)"
        } else {
            "atomic"
        }
    );

    info!("\nBuild timings:");
    for (i, elapsed) in summary.timings.iter().enumerate() {
        info!("  Build {}: {:.3?}", i + 1, elapsed);
    }
    if summary.timings.len() > 1 {
        let total: Duration = summary.timings.iter().sum();
        let best = summary.timings.iter().min().copied().unwrap_or_default();
        info!(
            "  Mean: {:.3?}, best: {:.3?}",
            total / summary.timings.len() as u32,
            best
        );
    }

    let trace: f64 = summary.matrix.component_mul(&system.density).sum();
    info!("\nTr(D G): {:.10}", trace);

    if let Some(deviation) = summary.max_deviation {
        info!("Max deviation from reference: {:.3e}", deviation);
    }
}
