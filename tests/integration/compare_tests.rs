//! Integration tests for the compare command

use crate::common::{assertions, sample_data, CliTestRunner};
use logdiff::{LogdiffError, Value};
use pretty_assertions::assert_eq;
use std::fs;

/// Parse `logs` into a golden JSON snapshot named `name`
fn golden(runner: &CliTestRunner, name: &str, logs: &[&str]) {
    let fixture = runner.fixture();
    let mut args = vec!["parse".to_string()];
    args.extend(logs.iter().map(|log| fixture.path_str(log)));
    args.extend(["--output".to_string(), fixture.path_str(name)]);

    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    assert_eq!(runner.expect_exit(&args), 0);
}

#[test]
fn test_compare_identical_results() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", &sample_data::log("alpha", "10")).unwrap();
    golden(&runner, "golden.json", &["alpha.log"]);

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.json"),
        &fixture.path_str("alpha.log"),
        &fixture.path_str("diff.json"),
    ]);
    assert_eq!(code, 0);

    let diff = fixture.root().join("diff.json");
    assertions::assert_file_exists_and_not_empty(&diff);
    let records = assertions::read_snapshot(&diff).unwrap();
    assert_eq!(records["alpha"]["count"], Value::Int(10));
    assert_eq!(records["alpha"]["status"], Value::from("pass"));
}

#[test]
fn test_compare_changed_value_fails() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("golden.log", &sample_data::log("alpha", "10")).unwrap();
    golden(&runner, "golden.json", &["golden.log"]);
    fixture.create_log("observed.log", &sample_data::log("alpha", "11")).unwrap();

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.json"),
        &fixture.path_str("observed.log"),
        &fixture.path_str("diff.json"),
    ]);
    assert_eq!(code, 1);

    // the diff file carries the observed value forward
    let records = assertions::read_snapshot(&fixture.root().join("diff.json")).unwrap();
    assert_eq!(records["alpha"]["count"], Value::Int(11));
}

#[test]
fn test_compare_numeric_representations_match() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("golden.log", &sample_data::log("alpha", "10")).unwrap();
    fixture.create_log("observed.log", &sample_data::log("alpha", "10.0")).unwrap();

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.log"),
        &fixture.path_str("observed.log"),
        &fixture.path_str("diff.json"),
    ]);
    assert_eq!(code, 0);
}

#[test]
fn test_compare_status_change_fails() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("golden.log", &sample_data::log("alpha", "3")).unwrap();
    fixture.create_log("observed.log", &sample_data::failing_log("alpha", "3")).unwrap();

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.log"),
        &fixture.path_str("observed.log"),
        &fixture.path_str("diff.json"),
    ]);
    assert_eq!(code, 1);

    let raw: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(fixture.root().join("diff.json")).unwrap()).unwrap();
    assert_eq!(raw["alpha"]["status"], "fail");
}

#[test]
fn test_compare_missing_and_new_entries() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", &sample_data::log("alpha", "1")).unwrap();
    fixture.create_log("beta.log", &sample_data::log("beta", "2")).unwrap();
    golden(&runner, "golden.json", &["alpha.log"]);

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.json"),
        &fixture.path_str("beta.log"),
        &fixture.path_str("diff.json"),
    ]);
    assert_eq!(code, 2);
    assert_eq!(
        assertions::snapshot_keys(&fixture.root().join("diff.json")).unwrap(),
        vec!["beta"]
    );
}

#[test]
fn test_compare_subset_tolerates_missing_entries() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", &sample_data::log("alpha", "1")).unwrap();
    fixture.create_log("beta.log", &sample_data::log("beta", "2")).unwrap();
    golden(&runner, "golden.json", &["alpha.log"]);

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.json"),
        &fixture.path_str("beta.log"),
        &fixture.path_str("diff.json"),
        "--subset",
    ]);
    // only the new entry counts
    assert_eq!(code, 1);
    assert_eq!(
        assertions::snapshot_keys(&fixture.root().join("diff.json")).unwrap(),
        vec!["alpha", "beta"]
    );
}

#[test]
fn test_compare_subset_of_identical_results() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", &sample_data::log("alpha", "1")).unwrap();
    fixture.create_log("beta.log", &sample_data::log("beta", "2")).unwrap();
    golden(&runner, "golden.json", &["alpha.log", "beta.log"]);

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.json"),
        &fixture.path_str("beta.log"),
        &fixture.path_str("diff.json"),
        "--subset",
    ]);
    assert_eq!(code, 0);
}

#[test]
fn test_compare_csv_tables() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture
        .create_file("golden.csv", "test, count, status\nalpha, 10, pass\nbeta, 7, fail\n")
        .unwrap();
    fixture
        .create_file("observed.csv", "test, count, status\nalpha, 10, pass\nbeta, 8, fail\n")
        .unwrap();
    let diff = fixture.path_str("diff.csv");

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.csv"),
        &fixture.path_str("observed.csv"),
        &diff,
        "--csv",
    ]);
    assert_eq!(code, 1);

    let content = fs::read_to_string(&diff).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["test , count, status", "alpha, 10   , pass", "beta , 8    , fail"]);
}

#[test]
fn test_compare_json_report_format() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("golden.log", &sample_data::log("alpha", "1")).unwrap();
    fixture.create_log("observed.log", &sample_data::log("alpha", "2")).unwrap();

    let code = runner.expect_exit(&[
        "compare",
        &fixture.path_str("golden.log"),
        &fixture.path_str("observed.log"),
        &fixture.path_str("diff.json"),
        "--format",
        "json",
    ]);
    assert_eq!(code, 1);
}

#[test]
fn test_compare_invalid_report_format() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", &sample_data::log("alpha", "1")).unwrap();
    let log = fixture.path_str("alpha.log");

    let err = runner.expect_failure(&["compare", &log, &log, &fixture.path_str("diff.json"), "--format", "yaml"]);
    assert!(matches!(err, LogdiffError::InvalidInput { .. }));
    assert!(!fixture.root().join("diff.json").exists());
}

#[test]
fn test_compare_missing_golden_is_fatal() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", &sample_data::log("alpha", "1")).unwrap();

    let err = runner.expect_failure(&[
        "compare",
        &fixture.path_str("nope.json"),
        &fixture.path_str("alpha.log"),
        &fixture.path_str("diff.json"),
    ]);
    assert!(matches!(err, LogdiffError::InputNotFound { .. }));
    assert_eq!(err.exit_code(), 255);
}
