use crate::run_workers;
use anyhow::Result;
use kex_graph::{canonicalize, decompose, total_weight, Graph};
use kex_structs::{
    config::SolverConfig,
    core::{length_str, Instance, MatchResult, Output, Strategy},
};
use log::{info, warn};
use std::time::Instant;

/// Runs a strategy once. `Ok(None)` is a soft failure the driver may retry with a tighter bound.
pub trait Runner {
    fn run(
        &mut self,
        strategy: Strategy,
        instance: &Instance,
        config: &SolverConfig,
    ) -> Result<Option<(Strategy, Output)>>;
}

/// Runs every attempt in `kex-worker` processes, all race members at once for
/// `Strategy::Race`. An attempt that overruns is killed with its process.
#[derive(Debug, Default, Clone, Copy)]
pub struct WorkerRunner;

impl Runner for WorkerRunner {
    fn run(
        &mut self,
        strategy: Strategy,
        instance: &Instance,
        config: &SolverConfig,
    ) -> Result<Option<(Strategy, Output)>> {
        let strategies = match strategy {
            Strategy::Race => Strategy::RACE_MEMBERS.to_vec(),
            single => vec![single],
        };
        Ok(run_workers(&strategies, instance, config)?
            .and_then(|worker| worker.output.map(|output| (worker.strategy, output))))
    }
}

/// Solves `instance` with `strategy`, relaxing the cycle bound by one after every failed attempt
/// while `config.decrease` allows it. Each attempt gets the full `config.timeout_secs`.
pub fn drive(
    runner: &mut dyn Runner,
    instance: &Instance,
    strategy: Strategy,
    config: &SolverConfig,
) -> Result<Option<MatchResult>> {
    instance.validate()?;
    let n = instance.num_vertices;
    let mut max_cycle_length = instance.max_cycle_length;
    loop {
        if max_cycle_length == 0 {
            warn!("Maximum cycle length is 0, no solution");
            return Ok(None);
        }
        info!("Maximum cycle length: {}", length_str(max_cycle_length, n));
        info!("Maximum chain length: {}", length_str(instance.max_chain_length, n));
        let attempt = instance.with_max_cycle_length(max_cycle_length);
        let start = Instant::now();
        if let Some((winner, output)) = runner.run(strategy, &attempt, config)? {
            let time = start.elapsed().as_secs_f64();
            let graph = Graph::new(&attempt);
            let mut entries = decompose(&graph, &output);
            canonicalize(&mut entries);
            info!(
                "{} found {} entries with value {} in {:.3}s",
                winner,
                entries.len(),
                output.value,
                time
            );
            return Ok(Some(MatchResult {
                strategy: winner,
                value: total_weight(&entries),
                entries,
                optimal: output.optimal,
                time,
                max_cycle_length,
            }));
        }
        if !config.decrease || strategy == Strategy::Fallback {
            warn!("{} found no solution", strategy);
            return Ok(None);
        }
        // any bound >= n behaves like n
        max_cycle_length = max_cycle_length.min(n) - 1;
        warn!("Timed out, decreasing maximum cycle length to {}", max_cycle_length);
    }
}
