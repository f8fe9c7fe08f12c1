mod common;

use common::{brute_force, check_output, random_instance};
use kex_algorithms::fallback::{self, assignment, matching, select, Fallback};
use kex_graph::{Graph, Track};
use kex_structs::core::{EntryKind, Instance, UNBOUNDED};

fn instance(
    n: usize,
    edges: &[(usize, usize, f64)],
    sources: &[usize],
    max_cycle_length: usize,
    max_chain_length: usize,
) -> Instance {
    Instance {
        num_vertices: n,
        edges: edges.to_vec(),
        sources: sources.to_vec(),
        forbidden: vec![],
        max_cycle_length,
        max_chain_length,
    }
}

#[test]
fn test_min_cost_assignment() {
    let cost = vec![
        vec![4.0, 1.0, 3.0],
        vec![2.0, 0.0, 5.0],
        vec![3.0, 2.0, 2.0],
    ];
    assert_eq!(assignment::min_cost_assignment(&cost), vec![1, 0, 2]);
    assert_eq!(assignment::min_cost_assignment(&[]), Vec::<usize>::new());
}

#[test]
fn test_selection_order() {
    let n2 = instance(2, &[(0, 1, 1.0), (1, 0, 1.0)], &[], 2, 0);
    assert_eq!(select(&n2, &Graph::new(&n2)), Some(Fallback::Assignment));

    let pairs = instance(3, &[(0, 1, 1.0), (1, 0, 1.0)], &[], 2, 0);
    assert_eq!(select(&pairs, &Graph::new(&pairs)), Some(Fallback::Matching));

    let bounded = instance(4, &[(0, 1, 1.0), (1, 0, 1.0)], &[], 3, 0);
    assert_eq!(select(&bounded, &Graph::new(&bounded)), None);

    let mut forbidden = instance(3, &[(0, 1, 1.0), (1, 0, 1.0)], &[], UNBOUNDED, UNBOUNDED);
    forbidden.forbidden = vec![1];
    assert_eq!(select(&forbidden, &Graph::new(&forbidden)), None);

    let short_chains = instance(4, &[(0, 1, 1.0)], &[0], UNBOUNDED, 2);
    assert_eq!(select(&short_chains, &Graph::new(&short_chains)), None);
    let long_chains = instance(4, &[(0, 1, 1.0)], &[0], 2, 2);
    assert_eq!(select(&long_chains, &Graph::new(&long_chains)), None);
    assert!(fallback::solve(&long_chains).unwrap().is_none());
}

#[test]
fn test_assignment_cycles_and_chain() {
    // chain 0 -> 1 -> 2, cycle 3 -> 4 -> 5 -> 3, the arc 2 -> 0 must not close a cycle
    let inst = instance(
        6,
        &[
            (0, 1, 2.0),
            (1, 2, 2.0),
            (2, 0, 5.0),
            (3, 4, 1.0),
            (4, 5, 1.0),
            (5, 3, 1.0),
        ],
        &[0],
        UNBOUNDED,
        UNBOUNDED,
    );
    let output = fallback::solve(&inst).unwrap().unwrap();
    assert!(output.optimal);
    assert_eq!(output.value, 7.0);
    let (entries, total) = check_output(&inst, &output);
    assert_eq!(total, 7.0);
    assert_eq!(entries[0].kind, EntryKind::Chain);
    assert_eq!(entries[0].vertices, vec![0, 1, 2]);
    assert_eq!(entries[1].vertices, vec![3, 4, 5]);
}

#[test]
fn test_assignment_self_loop() {
    let inst = instance(3, &[(0, 0, 3.0), (1, 2, 1.0), (2, 1, 1.0)], &[], UNBOUNDED, 0);
    let output = fallback::solve(&inst).unwrap().unwrap();
    let (entries, total) = check_output(&inst, &output);
    assert_eq!(total, 5.0);
    assert_eq!(entries.len(), 2);
}

#[test]
fn test_matching_pairs_loops_and_chains() {
    let inst = instance(
        6,
        &[
            (1, 2, 1.0),
            (2, 1, 1.0),
            (2, 3, 5.0),
            (3, 2, 5.0),
            (4, 4, 2.0),
            (0, 1, 3.0),
            (0, 5, 1.0),
            (5, 4, 9.0),
        ],
        &[0],
        2,
        1,
    );
    let graph = Graph::new(&inst);
    assert!(matching::applies(&inst, &graph));
    let output = fallback::solve(&inst).unwrap().unwrap();
    let (entries, total) = check_output(&inst, &output);
    // 0 -> 1, (2 3), (4 4); 5 -> 4 is not a pair
    assert_eq!(total, 3.0 + 10.0 + 2.0);
    assert_eq!(output.value, total);
    assert_eq!(entries.len(), 3);
    assert_eq!(entries[0].vertices, vec![0, 1]);
}

#[test]
fn test_fallbacks_against_brute_force() {
    for seed in 0..12u8 {
        let unbounded = Track {
            num_vertices: 7,
            num_sources: (seed % 3) as usize,
            edge_percent: 35,
            max_cycle_length: UNBOUNDED,
            max_chain_length: UNBOUNDED,
            forbidden_percent: 0,
        };
        let inst = random_instance(seed, &unbounded);
        let output = fallback::solve(&inst).unwrap().unwrap();
        let (_, total) = check_output(&inst, &output);
        assert!((total - brute_force(&inst)).abs() < 1e-6, "seed {}", seed);

        let pairs = Track {
            max_cycle_length: 2,
            max_chain_length: (seed % 2) as usize,
            edge_percent: 50,
            ..unbounded
        };
        let inst = random_instance(seed, &pairs);
        let output = fallback::solve(&inst).unwrap().unwrap();
        let (_, total) = check_output(&inst, &output);
        assert!((total - brute_force(&inst)).abs() < 1e-6, "seed {}", seed);
    }
}

#[test]
fn test_assignment_with_heavy_edges() {
    // no cycle through the lone arc, so nothing may be selected
    let lone = instance(2, &[(0, 1, 3e8)], &[], UNBOUNDED, UNBOUNDED);
    assert!(assignment::penalty(&lone) > 3e8);
    let output = fallback::solve(&lone).unwrap().unwrap();
    let (entries, total) = check_output(&lone, &output);
    assert!(entries.is_empty());
    assert_eq!(total, 0.0);

    let inst = instance(
        3,
        &[(0, 1, 3e8), (1, 0, 1.0), (1, 2, 5e8)],
        &[],
        UNBOUNDED,
        UNBOUNDED,
    );
    let output = fallback::solve(&inst).unwrap().unwrap();
    let (entries, total) = check_output(&inst, &output);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].vertices, vec![0, 1]);
    assert_eq!(total, 3e8 + 1.0);
}

#[test]
fn test_integer_weights() {
    assert_eq!(matching::integer_weights(&[2.0, 7.0]), Some(vec![2, 7]));
    assert_eq!(
        matching::integer_weights(&[1.4, 2.6, 1e7]),
        Some(vec![14, 26, 100_000_000])
    );
    assert_eq!(matching::integer_weights(&[1.0 / 3.0]), None);
    assert_eq!(matching::integer_weights(&[1e9, 1e9]), None);
    assert_eq!(matching::integer_weights(&[]), Some(vec![]));
}

#[test]
fn test_matching_keeps_fractional_weights_exact() {
    let inst = instance(
        6,
        &[
            (0, 1, 0.7),
            (1, 0, 0.7),
            (2, 3, 0.7),
            (3, 2, 0.7),
            (1, 2, 1.3),
            (2, 1, 1.3),
            (4, 5, 5e6),
            (5, 4, 5e6),
        ],
        &[],
        2,
        0,
    );
    assert_eq!(select(&inst, &Graph::new(&inst)), Some(Fallback::Matching));
    let output = fallback::solve(&inst).unwrap().unwrap();
    let (entries, total) = check_output(&inst, &output);
    assert_eq!(entries.len(), 3);
    assert!((total - brute_force(&inst)).abs() < 1e-6);
    assert!((total - 10_000_002.8).abs() < 1e-6);
}

#[test]
fn test_matching_declines_weights_without_integer_form() {
    let inst = instance(3, &[(0, 1, 1.0 / 3.0), (1, 0, 1.0)], &[], 2, 0);
    let graph = Graph::new(&inst);
    assert!(!matching::applies(&inst, &graph));
    assert_eq!(select(&inst, &graph), None);
    assert!(fallback::solve(&inst).unwrap().is_none());
}
