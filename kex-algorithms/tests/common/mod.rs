#![allow(dead_code)]

use kex_graph::{canonicalize, decompose, generate_instance, verify_result, Graph, Track};
use kex_structs::core::{Entry, Instance, Output};
use std::collections::HashMap;

pub fn random_instance(seed: u8, track: &Track) -> Instance {
    generate_instance(&[seed; 32], track).unwrap()
}

/// Decomposes `output`, checks feasibility and returns the entries with their total.
pub fn check_output(instance: &Instance, output: &Output) -> (Vec<Entry>, f64) {
    let graph = Graph::new(instance);
    let mut entries = decompose(&graph, output);
    canonicalize(&mut entries);
    let total = verify_result(instance, &entries)
        .unwrap_or_else(|e| panic!("invalid result {:?}: {}", entries, e));
    (entries, total)
}

fn extend_paths(
    graph: &Graph,
    path: &mut Vec<usize>,
    max_len: usize,
    out: &mut Vec<(u32, f64)>,
    weight: f64,
) {
    let last = *path.last().unwrap();
    let edges = path.len() - 1;
    if edges >= 1 && !graph.is_forbidden[last] {
        out.push((mask(path), weight));
    }
    if edges == max_len {
        return;
    }
    for &v in &graph.out_neighbors[last] {
        if graph.is_source[v] || path.contains(&v) {
            continue;
        }
        path.push(v);
        extend_paths(graph, path, max_len, out, weight + graph.weight(last, v));
        path.pop();
    }
}

fn extend_cycles(
    graph: &Graph,
    path: &mut Vec<usize>,
    max_len: usize,
    out: &mut Vec<(u32, f64)>,
    weight: f64,
) {
    let root = path[0];
    let last = *path.last().unwrap();
    if graph.has_edge(last, root) {
        out.push((mask(path), weight + graph.weight(last, root)));
    }
    if path.len() == max_len {
        return;
    }
    for &v in &graph.out_neighbors[last] {
        if v <= root || graph.is_source[v] || path.contains(&v) {
            continue;
        }
        path.push(v);
        extend_cycles(graph, path, max_len, out, weight + graph.weight(last, v));
        path.pop();
    }
}

fn mask(vertices: &[usize]) -> u32 {
    vertices.iter().fold(0, |m, &v| m | (1 << v))
}

fn best(n: usize, used: u32, options: &[Vec<(u32, f64)>], memo: &mut HashMap<u32, f64>) -> f64 {
    let Some(v) = (0..n).find(|&v| used & (1 << v) == 0) else {
        return 0.0;
    };
    if let Some(&value) = memo.get(&used) {
        return value;
    }
    let mut value = best(n, used | (1 << v), options, memo);
    for &(m, w) in &options[v] {
        if m & used == 0 {
            value = value.max(w + best(n, used | m, options, memo));
        }
    }
    memo.insert(used, value);
    value
}

/// Optimal total weight by exhaustive search over all cycles and chains. Small graphs only.
pub fn brute_force(instance: &Instance) -> f64 {
    let graph = Graph::new(instance);
    let n = graph.num_vertices;
    assert!(n <= 12);
    let mut entries = Vec::new();
    for s in graph.sources.iter().copied() {
        let max_len = instance.max_chain_length.min(n);
        extend_paths(&graph, &mut vec![s], max_len, &mut entries, 0.0);
    }
    for root in graph.patients() {
        let max_len = instance.max_cycle_length.min(n);
        if max_len >= 1 {
            extend_cycles(&graph, &mut vec![root], max_len, &mut entries, 0.0);
        }
    }
    // index every entry by its smallest vertex
    let mut options = vec![Vec::new(); n];
    for (m, w) in entries {
        options[m.trailing_zeros() as usize].push((m, w));
    }
    best(n, 0, &options, &mut HashMap::new())
}
