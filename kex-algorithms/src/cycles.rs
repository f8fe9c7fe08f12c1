use kex_graph::Graph;
use kex_utils::Deadline;

/// Expansions between two deadline checks inside a single root.
const CHECK_INTERVAL: u64 = 1 << 14;

/// All simple cycles of length `2..=k` that avoid sources, each rooted at its smallest vertex.
///
/// Returns `None` when `deadline` expires before the search completes, which is distinct
/// from finding no cycles. The output is sorted.
pub fn find_cycles(graph: &Graph, k: usize, deadline: &Deadline) -> Option<Vec<Vec<usize>>> {
    let mut cycles = Vec::new();
    if k < 2 {
        return Some(cycles);
    }
    let n = graph.num_vertices;
    let mut path = vec![0; k];
    let mut cursor = vec![0; k];
    let mut on_path = vec![false; n];
    let mut expansions: u64 = 0;

    for root in 0..n {
        if deadline.expired() {
            return None;
        }
        if graph.is_source[root] {
            continue;
        }
        path[0] = root;
        cursor[0] = 0;
        on_path[root] = true;
        let mut depth = 0;
        loop {
            let u = path[depth];
            let neighbors = &graph.out_neighbors[u];
            if cursor[depth] == neighbors.len() {
                on_path[u] = false;
                if depth == 0 {
                    break;
                }
                depth -= 1;
                continue;
            }
            let v = neighbors[cursor[depth]];
            cursor[depth] += 1;
            if v == root {
                if depth > 0 {
                    cycles.push(path[..=depth].to_vec());
                }
            } else if depth + 1 < k && v > root && !on_path[v] && !graph.is_source[v] {
                expansions += 1;
                if expansions % CHECK_INTERVAL == 0 && deadline.expired() {
                    return None;
                }
                depth += 1;
                path[depth] = v;
                cursor[depth] = 0;
                on_path[v] = true;
            }
        }
    }
    cycles.sort();
    Some(cycles)
}
