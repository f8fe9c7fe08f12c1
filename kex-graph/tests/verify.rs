use kex_graph::verify_result;
use kex_structs::core::{Entry, EntryKind, Instance};

fn instance() -> Instance {
    Instance {
        num_vertices: 5,
        edges: vec![
            (0, 1, 1.0),
            (1, 2, 1.0),
            (2, 1, 2.0),
            (3, 4, 1.0),
            (4, 3, 1.0),
            (1, 3, 1.0),
            (3, 1, 1.0),
        ],
        sources: vec![0],
        forbidden: vec![3],
        max_cycle_length: 2,
        max_chain_length: 2,
    }
}

fn cycle(vertices: Vec<usize>, weights: Vec<f64>) -> Entry {
    Entry {
        kind: EntryKind::Cycle,
        vertices,
        weights,
    }
}

fn chain(vertices: Vec<usize>, weights: Vec<f64>) -> Entry {
    Entry {
        kind: EntryKind::Chain,
        vertices,
        weights,
    }
}

#[test]
fn test_verify_valid() {
    let entries = vec![
        chain(vec![0, 1, 2], vec![1.0, 1.0, 0.0]),
        cycle(vec![3, 4], vec![1.0, 1.0]),
    ];
    assert_eq!(verify_result(&instance(), &entries).unwrap(), 4.0);
    assert_eq!(verify_result(&instance(), &[]).unwrap(), 0.0);
}

#[test]
fn test_verify_rejects_repeated_vertex() {
    let entries = vec![
        cycle(vec![1, 2], vec![1.0, 2.0]),
        cycle(vec![1, 3], vec![1.0, 1.0]),
    ];
    assert!(verify_result(&instance(), &entries).is_err());
}

#[test]
fn test_verify_rejects_long_cycle() {
    let mut inst = instance();
    inst.edges.push((2, 3, 1.0));
    inst.edges.push((3, 2, 1.0));
    inst.edges.push((2, 4, 1.0));
    inst.edges.push((4, 2, 1.0));
    let entries = vec![cycle(vec![2, 4, 3], vec![1.0, 1.0, 1.0])];
    assert!(verify_result(&inst, &entries).is_err());
}

#[test]
fn test_verify_rejects_bad_chain() {
    // does not start at a source
    let entries = vec![chain(vec![1, 2], vec![1.0, 0.0])];
    assert!(verify_result(&instance(), &entries).is_err());
    // ends at a forbidden vertex
    let entries = vec![chain(vec![0, 1, 3], vec![1.0, 1.0, 0.0])];
    assert!(verify_result(&instance(), &entries).is_err());
    // too long
    let mut inst = instance();
    inst.max_chain_length = 1;
    let entries = vec![chain(vec![0, 1, 2], vec![1.0, 1.0, 0.0])];
    assert!(verify_result(&inst, &entries).is_err());
}

#[test]
fn test_verify_rejects_missing_edge_and_wrong_weight() {
    let entries = vec![cycle(vec![2, 4], vec![1.0, 1.0])];
    assert!(verify_result(&instance(), &entries).is_err());
    let entries = vec![cycle(vec![1, 2], vec![1.0, 1.0])];
    assert!(verify_result(&instance(), &entries).is_err());
}
