use crate::Graph;
use anyhow::{anyhow, Result};
use kex_structs::core::{Entry, EntryKind, Instance};

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Checks that `entries` is a feasible cover for `instance` and returns its total weight.
pub fn verify_result(instance: &Instance, entries: &[Entry]) -> Result<f64> {
    let graph = Graph::new(instance);
    let mut used = vec![false; graph.num_vertices];
    let mut total = 0.0;

    for (idx, entry) in entries.iter().enumerate() {
        let vertices = &entry.vertices;
        if vertices.is_empty() {
            return Err(anyhow!("Entry {} is empty", idx));
        }
        if vertices.len() != entry.weights.len() {
            return Err(anyhow!(
                "Entry {} has {} vertices but {} weights",
                idx,
                vertices.len(),
                entry.weights.len()
            ));
        }
        for &v in vertices {
            if v >= graph.num_vertices {
                return Err(anyhow!("Entry {}: vertex {} is out of bounds", idx, v));
            }
            if used[v] {
                return Err(anyhow!("Vertex {} appears in more than one entry", v));
            }
            used[v] = true;
        }

        let steps: Vec<(usize, usize)> = match entry.kind {
            EntryKind::Cycle => {
                let c = vertices.len();
                if c > instance.max_cycle_length {
                    return Err(anyhow!(
                        "Entry {}: cycle length {} exceeds maximum {}",
                        idx,
                        c,
                        instance.max_cycle_length
                    ));
                }
                if let Some(&s) = vertices.iter().find(|&&v| graph.is_source[v]) {
                    return Err(anyhow!("Entry {}: source {} is part of a cycle", idx, s));
                }
                (0..c).map(|j| (vertices[j], vertices[(j + 1) % c])).collect()
            }
            EntryKind::Chain => {
                let length = vertices.len() - 1;
                if length == 0 {
                    return Err(anyhow!("Entry {}: chain without edges", idx));
                }
                if !graph.is_source[vertices[0]] {
                    return Err(anyhow!(
                        "Entry {}: chain starts at {} which is not a source",
                        idx,
                        vertices[0]
                    ));
                }
                if length > instance.max_chain_length {
                    return Err(anyhow!(
                        "Entry {}: chain length {} exceeds maximum {}",
                        idx,
                        length,
                        instance.max_chain_length
                    ));
                }
                if let Some(&s) = vertices[1..].iter().find(|&&v| graph.is_source[v]) {
                    return Err(anyhow!("Entry {}: source {} receives an edge", idx, s));
                }
                let last = vertices[length];
                if graph.is_forbidden[last] {
                    return Err(anyhow!(
                        "Entry {}: forbidden vertex {} ends a chain unbalanced",
                        idx,
                        last
                    ));
                }
                if entry.weights[length] != 0.0 {
                    return Err(anyhow!("Entry {}: chain terminal carries a weight", idx));
                }
                (0..length).map(|j| (vertices[j], vertices[j + 1])).collect()
            }
        };

        for (j, &(u, v)) in steps.iter().enumerate() {
            if !graph.has_edge(u, v) {
                return Err(anyhow!("Entry {}: edge ({}, {}) does not exist", idx, u, v));
            }
            let expected = graph.weight(u, v);
            if (entry.weights[j] - expected).abs() > WEIGHT_TOLERANCE {
                return Err(anyhow!(
                    "Entry {}: edge ({}, {}) reported weight {} but has {}",
                    idx,
                    u,
                    v,
                    entry.weights[j],
                    expected
                ));
            }
            total += expected;
        }
    }
    Ok(total)
}
