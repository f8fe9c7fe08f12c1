pub mod assignment;
pub mod matching;

use anyhow::Result;
use kex_graph::Graph;
use kex_structs::core::{Instance, Output};
use log::{info, warn};
use logging_timer::time;

/// Exact solvers for structurally simple instances, tried in a fixed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback {
    Assignment,
    Matching,
}

pub fn select(instance: &Instance, graph: &Graph) -> Option<Fallback> {
    if assignment::applies(instance, graph) {
        Some(Fallback::Assignment)
    } else if matching::applies(instance, graph) {
        Some(Fallback::Matching)
    } else {
        None
    }
}

#[time]
pub fn solve(instance: &Instance) -> Result<Option<Output>> {
    let graph = Graph::new(instance);
    match select(instance, &graph) {
        Some(Fallback::Assignment) => {
            info!("Choosing fallback: assignment");
            Ok(Some(assignment::solve(instance, &graph)))
        }
        Some(Fallback::Matching) => {
            info!("Choosing fallback: matching");
            Ok(matching::solve(instance, &graph))
        }
        None => {
            warn!("No fallback formulation applies to this instance");
            Ok(None)
        }
    }
}
