use kex_structs::{
    config::SolverConfig,
    core::{Instance, MatchResult, Strategy, Task, WorkerOutput},
};
use kex_utils::{dejsonify, jsonify};
use std::{
    io::Write,
    process::{Command, Stdio},
};

const WORKER: &str = env!("CARGO_BIN_EXE_kex-worker");

fn instance(max_cycle_length: usize) -> Instance {
    Instance {
        num_vertices: 3,
        edges: vec![(0, 1, 2.0), (1, 0, 2.0), (1, 2, 4.0), (2, 1, 4.0)],
        sources: vec![],
        forbidden: vec![],
        max_cycle_length,
        max_chain_length: 0,
    }
}

#[test]
fn test_compute_solution_from_stdin() {
    let task = Task {
        strategy: Strategy::Fallback,
        instance: instance(2),
        config: SolverConfig::default(),
    };
    let mut child = Command::new(WORKER)
        .arg("compute_solution")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();
    child
        .stdin
        .take()
        .unwrap()
        .write_all(jsonify(&task).as_bytes())
        .unwrap();
    let result = child.wait_with_output().unwrap();
    assert!(result.status.success());
    let output: WorkerOutput = dejsonify(String::from_utf8(result.stdout).unwrap().trim()).unwrap();
    assert_eq!(output.strategy, Strategy::Fallback);
    let output = output.output.unwrap();
    assert!((output.value - 8.0).abs() < 1e-6);
}

#[test]
fn test_compute_solution_invalid_task() {
    let result = Command::new(WORKER)
        .arg("compute_solution")
        .arg("{\"strategy\":\"basic\"}")
        .stderr(Stdio::null())
        .output()
        .unwrap();
    assert!(!result.status.success());
}

#[test]
fn test_solve_prints_entries() {
    let result = Command::new(WORKER)
        .arg("solve")
        .arg(jsonify(&instance(2)))
        .arg("--strategy")
        .arg("basic")
        .arg("--config")
        .arg("{\"timeout_secs\": 30.0}")
        .stderr(Stdio::null())
        .output()
        .unwrap();
    assert!(result.status.success());
    let result: MatchResult = dejsonify(String::from_utf8(result.stdout).unwrap().trim()).unwrap();
    assert_eq!(result.strategy, Strategy::Basic);
    assert_eq!(result.entries.len(), 1);
    assert_eq!(result.entries[0].vertices, vec![1, 2]);
    assert_eq!(result.value, 8.0);
}

#[test]
fn test_solve_without_solution_exits_nonzero() {
    let result = Command::new(WORKER)
        .arg("solve")
        .arg(jsonify(&instance(0)))
        .arg("--no-decrease")
        .stderr(Stdio::null())
        .output()
        .unwrap();
    assert_eq!(result.status.code(), Some(1));
    assert!(result.stdout.is_empty());
}
