use crate::{Graph, SELECTION_THRESHOLD};
use kex_structs::core::{Entry, EntryKind, Output};

/// The unique selected out-neighbor of every vertex, if any.
pub fn find_recipients(num_vertices: usize, match_edges: &[(usize, usize, f64)]) -> Vec<Option<usize>> {
    let mut recipients = vec![None; num_vertices];
    for &(u, v, value) in match_edges {
        if value > SELECTION_THRESHOLD {
            recipients[u] = Some(v);
        }
    }
    recipients
}

/// Splits a selected-edge set into disjoint chains and cycles.
///
/// Chains are walked from vertices that have a successor but no predecessor, so a chain is
/// always reported from its origin whatever the vertex numbering. Every vertex left with a
/// successor afterwards lies on a cycle. Each vertex is emitted at most once.
pub fn decompose_edges(graph: &Graph, match_edges: &[(usize, usize, f64)]) -> Vec<Entry> {
    let n = graph.num_vertices;
    let recipients = find_recipients(n, match_edges);
    let mut has_donor = vec![false; n];
    for next in recipients.iter().flatten() {
        has_donor[*next] = true;
    }

    let mut visited = vec![false; n];
    let mut entries = Vec::new();

    for base in 0..n {
        if visited[base] || has_donor[base] || recipients[base].is_none() {
            continue;
        }
        let mut vertices = Vec::new();
        let mut weights = Vec::new();
        let mut current = base;
        loop {
            visited[current] = true;
            vertices.push(current);
            match recipients[current] {
                Some(next) if !visited[next] => {
                    weights.push(graph.weight(current, next));
                    current = next;
                }
                _ => {
                    weights.push(0.0);
                    break;
                }
            }
        }
        entries.push(Entry {
            kind: EntryKind::Chain,
            vertices,
            weights,
        });
    }

    for base in 0..n {
        if visited[base] || recipients[base].is_none() {
            continue;
        }
        let mut vertices = Vec::new();
        let mut weights = Vec::new();
        let mut current = base;
        let closed = loop {
            visited[current] = true;
            vertices.push(current);
            let Some(next) = recipients[current] else {
                break false;
            };
            weights.push(graph.weight(current, next));
            if next == base {
                break true;
            }
            if visited[next] {
                break false;
            }
            current = next;
        };
        if closed {
            entries.push(Entry {
                kind: EntryKind::Cycle,
                vertices,
                weights,
            });
        }
    }
    entries
}

/// Decomposes a full solution: the edge walk plus every chosen precomputed cycle.
pub fn decompose(graph: &Graph, output: &Output) -> Vec<Entry> {
    let mut entries = decompose_edges(graph, &output.match_edges);
    if let (Some(match_cycles), Some(graph_cycles)) = (&output.match_cycles, &output.graph_cycles) {
        for (value, cycle) in match_cycles.iter().zip(graph_cycles) {
            if *value > SELECTION_THRESHOLD {
                entries.push(Entry {
                    kind: EntryKind::Cycle,
                    vertices: cycle.clone(),
                    weights: graph.cycle_weights(cycle),
                });
            }
        }
    }
    entries
}

/// Rotates every cycle to start at its smallest vertex and sorts entries by kind then vertices.
pub fn canonicalize(entries: &mut Vec<Entry>) {
    for entry in entries.iter_mut() {
        if entry.kind != EntryKind::Cycle || entry.vertices.is_empty() {
            continue;
        }
        let min_index = entry
            .vertices
            .iter()
            .enumerate()
            .min_by_key(|(_, &v)| v)
            .map(|(i, _)| i)
            .unwrap_or(0);
        entry.vertices.rotate_left(min_index);
        entry.weights.rotate_left(min_index);
    }
    entries.sort_by(|a, b| a.kind.cmp(&b.kind).then_with(|| a.vertices.cmp(&b.vertices)));
}

/// Sum of all step weights.
pub fn total_weight(entries: &[Entry]) -> f64 {
    entries.iter().flat_map(|e| e.weights.iter()).sum()
}
