pub mod basic;
pub mod cycles;
pub mod extended;
pub mod fallback;
pub mod max_flow;

use anyhow::{anyhow, Result};
use kex_structs::{
    config::SolverConfig,
    core::{Instance, Output, Strategy},
};
use kex_utils::Deadline;
use log::info;
use std::time::Instant;

/// Runs one strategy in-process within `config.timeout_secs`.
///
/// `Ok(None)` means no solution: a timeout, an infeasible model or no applicable fallback.
pub fn solve_strategy(
    strategy: Strategy,
    instance: &Instance,
    config: &SolverConfig,
) -> Result<Option<Output>> {
    instance.validate()?;
    let start = Instant::now();
    let deadline = Deadline::new(config.timeout()?);
    info!(
        "Running {} on {} vertices, {} edges",
        strategy,
        instance.num_vertices,
        instance.edges.len()
    );
    let output = match strategy {
        Strategy::Fallback => fallback::solve(instance)?,
        Strategy::Basic => basic::solve(instance, config, &deadline)?,
        Strategy::Extended => extended::solve(instance, config, &deadline)?,
        Strategy::Race => return Err(anyhow!("race runs several strategies and needs a worker pool")),
    };
    Ok(output.map(|mut output| {
        output.time = start.elapsed().as_secs_f64();
        output
    }))
}
