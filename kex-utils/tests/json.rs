use kex_utils::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct Sample {
    zeta: u32,
    alpha: Vec<(usize, usize, f64)>,
}

#[test]
fn test_jsonify_sorts_keys() {
    let sample = Sample {
        zeta: 3,
        alpha: vec![(0, 1, 2.5)],
    };
    assert_eq!(jsonify(&sample), r#"{"alpha":[[0,1,2.5]],"zeta":3}"#);
}

#[test]
fn test_dejsonify_roundtrip_value() {
    let sample: Sample = dejsonify(r#"{"zeta":7,"alpha":[]}"#).unwrap();
    assert_eq!(
        sample,
        Sample {
            zeta: 7,
            alpha: vec![]
        }
    );
}

#[test]
fn test_load_json_inline_and_file() {
    let inline: Sample = load_json(r#"{"zeta":1,"alpha":[[2,3,1.0]]}"#).unwrap();
    assert_eq!(inline.alpha, vec![(2, 3, 1.0)]);

    let path = std::env::temp_dir().join(format!("kex-utils-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"zeta":9,"alpha":[]}"#).unwrap();
    let from_file: Sample = load_json(path.to_str().unwrap()).unwrap();
    assert_eq!(from_file.zeta, 9);
    std::fs::remove_file(&path).unwrap();
}

#[test]
fn test_load_json_reports_parse_errors() {
    assert!(load_json::<Sample>("not json").is_err());
    assert!(load_json::<Sample>("/definitely/missing/file.json").is_err());
}

#[test]
fn test_deadline_budget() {
    let deadline = Deadline::new(Duration::from_millis(50));
    assert!(!deadline.expired());
    assert!(deadline.remaining_secs() <= 0.05);
    std::thread::sleep(Duration::from_millis(60));
    assert!(deadline.expired());
    assert_eq!(deadline.remaining(), Duration::ZERO);

    let negative = Deadline::from_secs_f64(-1.0);
    assert!(negative.expired());

    let huge = Deadline::from_secs_f64(1e30);
    assert!(!huge.expired());
    assert_eq!(huge.budget(), Duration::MAX);
}
