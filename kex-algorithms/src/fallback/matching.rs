use kex_graph::Graph;
use kex_structs::core::{Instance, Output};
use mwmatching::{Matching, SENTINEL};

/// Largest total scaled weight handed to the integer matching solver. Its duals reach twice
/// the largest weight, which must stay inside `i32`.
const MAX_SCALED_TOTAL: f64 = (i32::MAX / 4) as f64;

/// Scaled weights may differ from an integer by at most this much.
const INTEGRALITY_EPS: f64 = 1e-6;

/// Pairs-only instances: every cycle is a reciprocal pair or a self-loop and every chain a
/// single edge out of a source. The pair weights must also have an exact integer form.
pub fn applies(instance: &Instance, graph: &Graph) -> bool {
    !graph.has_forbidden()
        && instance.max_cycle_length == 2
        && (graph.sources.is_empty() || instance.max_chain_length <= 1)
        && integer_weights(&weights(&pairs(instance, graph))).is_some()
}

/// The smallest power-of-ten scaling that turns every weight into an `i32` without rounding,
/// `None` when there is none within range.
pub fn integer_weights(weights: &[f64]) -> Option<Vec<i32>> {
    let total: f64 = weights.iter().sum();
    let mut scale = 1.0;
    for _ in 0..=9 {
        if total * scale > MAX_SCALED_TOTAL {
            return None;
        }
        let exact = weights
            .iter()
            .all(|&w| (w * scale - (w * scale).round()).abs() <= INTEGRALITY_EPS);
        if exact {
            return Some(weights.iter().map(|&w| (w * scale).round() as i32).collect());
        }
        scale *= 10.0;
    }
    None
}

enum Pair {
    Cycle(usize, usize),
    Chain(usize, usize),
    Loop(usize),
}

fn weights(pairs: &[(usize, usize, f64, Pair)]) -> Vec<f64> {
    pairs.iter().map(|p| p.2).collect()
}

fn pairs(instance: &Instance, graph: &Graph) -> Vec<(usize, usize, f64, Pair)> {
    let n = graph.num_vertices;
    let mut pairs: Vec<(usize, usize, f64, Pair)> = Vec::new();
    for u in graph.patients() {
        for &v in &graph.out_neighbors[u] {
            if u < v && !graph.is_source[v] && graph.has_edge(v, u) {
                pairs.push((u, v, graph.weight(u, v) + graph.weight(v, u), Pair::Cycle(u, v)));
            }
        }
    }
    let mut loops: Vec<usize> = graph
        .patients()
        .filter(|&v| graph.has_edge(v, v))
        .collect();
    loops.sort_unstable();
    for (i, &v) in loops.iter().enumerate() {
        pairs.push((v, n + i, graph.weight(v, v), Pair::Loop(v)));
    }
    if instance.max_chain_length == 1 {
        for &s in &graph.sources {
            for &v in &graph.out_neighbors[s] {
                if !graph.is_source[v] {
                    pairs.push((s, v, graph.weight(s, v), Pair::Chain(s, v)));
                }
            }
        }
    }

    pairs
}

/// `None` when the pair weights have no exact integer form; see `applies`.
pub fn solve(instance: &Instance, graph: &Graph) -> Option<Output> {
    let pairs = pairs(instance, graph);
    let scaled = integer_weights(&weights(&pairs))?;
    let edges = pairs
        .iter()
        .zip(scaled)
        .map(|(&(a, b, _, _), w)| (a, b, w))
        .collect();
    let mate = Matching::new(edges).solve();

    let mut match_edges = Vec::new();
    let mut value = 0.0;
    for (a, b, w, pair) in &pairs {
        if mate.get(*a).copied().unwrap_or(SENTINEL) != *b {
            continue;
        }
        value += w;
        match *pair {
            Pair::Cycle(u, v) => {
                match_edges.push((u, v, 1.0));
                match_edges.push((v, u, 1.0));
            }
            Pair::Chain(s, v) => match_edges.push((s, v, 1.0)),
            Pair::Loop(v) => match_edges.push((v, v, 1.0)),
        }
    }
    Some(Output::from_edges(match_edges, value, true))
}
