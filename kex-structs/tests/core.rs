use kex_structs::{config::*, core::*};
use kex_utils::{dejsonify, jsonify};

fn triangle() -> Instance {
    Instance {
        num_vertices: 3,
        edges: vec![(0, 1, 1.0), (1, 2, 2.0), (2, 0, 3.0)],
        sources: vec![],
        forbidden: vec![],
        max_cycle_length: 3,
        max_chain_length: 0,
    }
}

#[test]
fn test_validate_accepts_well_formed_instance() {
    assert!(triangle().validate().is_ok());
}

#[test]
fn test_validate_rejects_bad_instances() {
    let mut instance = triangle();
    instance.edges.push((0, 3, 1.0));
    assert!(instance.validate().is_err());

    let mut instance = triangle();
    instance.edges.push((0, 1, 5.0));
    assert!(instance.validate().is_err());

    let mut instance = triangle();
    instance.edges[0].2 = -1.0;
    assert!(instance.validate().is_err());

    let mut instance = triangle();
    instance.sources = vec![0];
    instance.forbidden = vec![0];
    assert!(instance.validate().is_err());
}

#[test]
fn test_bounds() {
    let instance = triangle();
    assert!(instance.cycles_unbounded());
    assert!(!instance.chains_unbounded());
    assert!(!instance.with_max_cycle_length(2).cycles_unbounded());
    assert_eq!(length_str(UNBOUNDED, 3), "Unbounded");
    assert_eq!(length_str(2, 3), "2");
}

#[test]
fn test_strategy_names() {
    assert_eq!(Strategy::from_name("basic"), Strategy::Basic);
    assert_eq!(Strategy::from_name("PCTSP"), Strategy::Extended);
    assert_eq!(Strategy::from_name("extended"), Strategy::Extended);
    assert_eq!(Strategy::from_name("fallback"), Strategy::Fallback);
    assert_eq!(Strategy::from_name("default"), Strategy::Race);
    assert_eq!(Strategy::from_name("whatever"), Strategy::Race);
    assert_eq!(Strategy::Extended.to_string(), "extended");
}

#[test]
fn test_task_json() {
    let task = Task {
        strategy: Strategy::Basic,
        instance: triangle(),
        config: SolverConfig::default(),
    };
    let parsed: Task = dejsonify(&jsonify(&task)).unwrap();
    assert_eq!(parsed, task);
}

#[test]
fn test_worker_output_without_result() {
    let parsed: WorkerOutput = dejsonify(r#"{"strategy":"fallback"}"#).unwrap();
    assert_eq!(parsed.strategy, Strategy::Fallback);
    assert!(parsed.output().is_none());
}

#[test]
fn test_config_defaults_and_overrides() {
    let config = SolverConfig::load(r#"{"timeout_secs": 5.0, "decrease": false}"#).unwrap();
    assert_eq!(config.timeout_secs, 5.0);
    assert!(!config.decrease);
    assert_eq!(config.eps, 1e-6);
    assert_eq!(config.poll_interval_ms, 10);
    assert_eq!(config.backend, BackendKind::Microlp);
    assert_eq!(config.with_timeout_secs(1.5).timeout().unwrap().as_millis(), 1500);
}

#[test]
fn test_config_rejects_unrepresentable_timeouts() {
    assert!(SolverConfig::default().with_timeout_secs(1e30).timeout().is_err());
    assert!(SolverConfig::load(r#"{"timeout_secs": 1e30}"#).is_err());
    assert!(SolverConfig::default()
        .with_timeout_secs(f64::INFINITY)
        .timeout()
        .is_err());

    let config = SolverConfig {
        timeout_secs: 2.0,
        grace_period_ms: 500,
        ..SolverConfig::default()
    };
    assert_eq!(config.worker_timeout().unwrap().as_millis(), 2500);
    assert_eq!(config.with_timeout_secs(-3.0).timeout().unwrap().as_millis(), 0);
    assert_eq!(config.with_timeout_secs(f64::NAN).timeout().unwrap().as_millis(), 0);
}
