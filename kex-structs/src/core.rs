use crate::{config::SolverConfig, serializable_struct_with_getters};
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::{collections::HashSet, fmt};

/// Length bound used for "no restriction". Any bound >= the vertex count behaves the same.
pub const UNBOUNDED: usize = usize::MAX / 2;

serializable_struct_with_getters! {
    Instance {
        num_vertices: usize,
        edges: Vec<(usize, usize, f64)>,
        sources: Vec<usize>,
        forbidden: Vec<usize>,
        max_cycle_length: usize,
        max_chain_length: usize,
    }
}

impl Instance {
    pub fn validate(&self) -> Result<()> {
        let n = self.num_vertices;
        let mut seen = HashSet::new();
        for &(u, v, w) in &self.edges {
            if u >= n || v >= n {
                return Err(anyhow!(
                    "Edge ({}, {}) references a vertex outside [0, {})",
                    u,
                    v,
                    n
                ));
            }
            if !w.is_finite() || w < 0.0 {
                return Err(anyhow!("Edge ({}, {}) has invalid weight {}", u, v, w));
            }
            if !seen.insert((u, v)) {
                return Err(anyhow!("Duplicate edge ({}, {})", u, v));
            }
        }
        let mut sources = HashSet::new();
        for &s in &self.sources {
            if s >= n {
                return Err(anyhow!("Source {} is out of bounds", s));
            }
            if !sources.insert(s) {
                return Err(anyhow!("Duplicate source {}", s));
            }
        }
        let mut forbidden = HashSet::new();
        for &f in &self.forbidden {
            if f >= n {
                return Err(anyhow!("Forbidden vertex {} is out of bounds", f));
            }
            if sources.contains(&f) {
                return Err(anyhow!("Vertex {} cannot be both a source and forbidden", f));
            }
            if !forbidden.insert(f) {
                return Err(anyhow!("Duplicate forbidden vertex {}", f));
            }
        }
        Ok(())
    }

    pub fn cycles_unbounded(&self) -> bool {
        self.max_cycle_length >= self.num_vertices
    }

    pub fn chains_unbounded(&self) -> bool {
        self.max_chain_length + 1 >= self.num_vertices
    }

    pub fn with_max_cycle_length(&self, max_cycle_length: usize) -> Self {
        Self {
            max_cycle_length,
            ..self.clone()
        }
    }
}

/// Human readable bound, "Unbounded" once it reaches the vertex count.
pub fn length_str(length: usize, num_vertices: usize) -> String {
    if length >= num_vertices {
        "Unbounded".to_string()
    } else {
        length.to_string()
    }
}

serializable_struct_with_getters! {
    Output {
        match_edges: Vec<(usize, usize, f64)>,
        match_cycles: Option<Vec<f64>>,
        graph_cycles: Option<Vec<Vec<usize>>>,
        value: f64,
        optimal: bool,
        time: f64,
    }
}

impl Output {
    pub fn from_edges(match_edges: Vec<(usize, usize, f64)>, value: f64, optimal: bool) -> Self {
        Self {
            match_edges,
            match_cycles: None,
            graph_cycles: None,
            value,
            optimal,
            time: -1.0,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Chain,
    Cycle,
}

serializable_struct_with_getters! {
    Entry {
        kind: EntryKind,
        vertices: Vec<usize>,
        weights: Vec<f64>,
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    Race,
    Fallback,
    Basic,
    Extended,
}

impl Strategy {
    /// Strategies started side by side by the race controller, in spawn order.
    pub const RACE_MEMBERS: [Strategy; 3] = [Strategy::Fallback, Strategy::Basic, Strategy::Extended];

    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "basic" => Strategy::Basic,
            "extended" | "pctsp" => Strategy::Extended,
            "fallback" => Strategy::Fallback,
            _ => Strategy::Race,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Strategy::Race => "race",
            Strategy::Fallback => "fallback",
            Strategy::Basic => "basic",
            Strategy::Extended => "extended",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

serializable_struct_with_getters! {
    Task {
        strategy: Strategy,
        instance: Instance,
        config: SolverConfig,
    }
}

serializable_struct_with_getters! {
    WorkerOutput {
        strategy: Strategy,
        output: Option<Output>,
    }
}

serializable_struct_with_getters! {
    MatchResult {
        strategy: Strategy,
        entries: Vec<Entry>,
        value: f64,
        optimal: bool,
        time: f64,
        max_cycle_length: usize,
    }
}
