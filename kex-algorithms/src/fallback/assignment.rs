use kex_graph::Graph;
use kex_structs::core::{Instance, Output};

/// Without a real cycle bound every permutation is a valid set of cycles, so the problem is an
/// assignment with self-assignment meaning "unmatched".
pub fn applies(instance: &Instance, graph: &Graph) -> bool {
    !graph.has_forbidden()
        && instance.cycles_unbounded()
        && (instance.chains_unbounded()
            || graph.sources.is_empty()
            || instance.max_chain_length == 0)
}

/// Minimum cost perfect assignment of rows to columns on a square matrix, shortest augmenting
/// paths with row and column potentials. Returns the column of every row.
pub fn min_cost_assignment(cost: &[Vec<f64>]) -> Vec<usize> {
    let n = cost.len();
    // 1-based, index 0 is the virtual root of each augmenting search
    let mut u = vec![0.0; n + 1];
    let mut v = vec![0.0; n + 1];
    let mut row_of = vec![0usize; n + 1];
    let mut way = vec![0usize; n + 1];

    for i in 1..=n {
        row_of[0] = i;
        let mut j0 = 0;
        let mut min_to = vec![f64::INFINITY; n + 1];
        let mut used = vec![false; n + 1];
        loop {
            used[j0] = true;
            let i0 = row_of[j0];
            let mut delta = f64::INFINITY;
            let mut j1 = 0;
            for j in 1..=n {
                if used[j] {
                    continue;
                }
                let reduced = cost[i0 - 1][j - 1] - u[i0] - v[j];
                if reduced < min_to[j] {
                    min_to[j] = reduced;
                    way[j] = j0;
                }
                if min_to[j] < delta {
                    delta = min_to[j];
                    j1 = j;
                }
            }
            for j in 0..=n {
                if used[j] {
                    u[row_of[j]] += delta;
                    v[j] -= delta;
                } else {
                    min_to[j] -= delta;
                }
            }
            j0 = j1;
            if row_of[j0] == 0 {
                break;
            }
        }
        loop {
            let j1 = way[j0];
            row_of[j0] = row_of[j1];
            j0 = j1;
            if j0 == 0 {
                break;
            }
        }
    }

    let mut column_of = vec![0; n];
    for j in 1..=n {
        column_of[row_of[j] - 1] = j - 1;
    }
    column_of
}

/// Cost of an arc that does not exist: larger than the total weight of the instance, so any
/// assignment using one costs more than the identity.
pub fn penalty(instance: &Instance) -> f64 {
    2.0 * instance.edges.iter().map(|(_, _, w)| w.abs()).sum::<f64>() + 1.0
}

pub fn solve(instance: &Instance, graph: &Graph) -> Output {
    let n = graph.num_vertices;
    let has_chains = instance.max_chain_length > 0 && !graph.sources.is_empty();
    let mut cost = vec![vec![penalty(instance); n]; n];
    for (i, row) in cost.iter_mut().enumerate() {
        row[i] = 0.0;
    }
    for &(i, j, w) in &instance.edges {
        if !graph.is_source[j] {
            cost[i][j] = -w;
        }
    }
    if has_chains {
        // a chain ends by "returning" to any source column for free
        for &s in &graph.sources {
            for i in graph.patients() {
                cost[i][s] = 0.0;
            }
        }
    }

    let column_of = min_cost_assignment(&cost);
    let mut match_edges = Vec::new();
    let mut value = 0.0;
    for (i, &j) in column_of.iter().enumerate() {
        if graph.is_source[j] || !graph.has_edge(i, j) {
            continue;
        }
        match_edges.push((i, j, 1.0));
        value += graph.weight(i, j);
    }
    Output::from_edges(match_edges, value, true)
}
