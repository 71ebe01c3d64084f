//! Integration tests for the parse command

use crate::common::{assertions, sample_data, CliTestRunner};
use logdiff::{LogdiffError, Value};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_parse_writes_json_snapshot() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", sample_data::noisy_log()).unwrap();
    fixture.create_log("beta.log", &sample_data::failing_log("beta", "7")).unwrap();
    let output = fixture.path_str("out.json");

    let code = runner.expect_exit(&[
        "parse",
        &fixture.path_str("alpha.log"),
        &fixture.path_str("beta.log"),
        "--output",
        &output,
    ]);
    assert_eq!(code, 0);

    let output = fixture.root().join("out.json");
    assertions::assert_file_exists_and_not_empty(&output);

    // the raw file keeps hidden values in DEFAULT only
    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert!(raw["alpha"].get("status").is_none());
    assert_eq!(raw["beta"]["status"], "fail");
    assert_eq!(raw["DEFAULT"]["status"], "pass");
    assert_eq!(raw["alpha"]["warnings"], serde_json::json!(["slow disk", "retry"]));

    let records = assertions::read_snapshot(&output).unwrap();
    assert_eq!(assertions::snapshot_keys(&output).unwrap(), vec!["alpha", "beta"]);
    assert_eq!(records["alpha"]["count"], Value::Int(10));
    assert_eq!(records["alpha"]["status"], Value::from("pass"));
    assert_eq!(records["beta"]["warnings"], Value::List(Vec::new()));
}

#[test]
fn test_parse_writes_csv_table() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", sample_data::noisy_log()).unwrap();
    fixture.create_log("beta.log", &sample_data::failing_log("beta", "7")).unwrap();
    let output = fixture.path_str("out.csv");

    runner.expect_exit(&[
        "parse",
        &fixture.path_str("alpha.log"),
        &fixture.path_str("beta.log"),
        "--csv",
        "-o",
        &output,
    ]);

    let content = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines, vec!["test , count, status", "alpha, 10   , pass", "beta , 7    , fail"]);
}

#[test]
fn test_parse_aliases_behave_alike() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    let log = fixture.create_log("alpha.log", &sample_data::log("alpha", "1")).unwrap();
    let log = log.to_string_lossy().into_owned();

    for (alias, out) in [("display", "a.json"), ("join", "b.json"), ("parse", "c.json")] {
        runner.expect_exit(&[alias, &log, "--output", &fixture.path_str(out)]);
    }

    let a = fs::read_to_string(fixture.root().join("a.json")).unwrap();
    assert_eq!(a, fs::read_to_string(fixture.root().join("b.json")).unwrap());
    assert_eq!(a, fs::read_to_string(fixture.root().join("c.json")).unwrap());
}

#[test]
fn test_parse_reads_its_own_snapshots() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("alpha.log", sample_data::noisy_log()).unwrap();
    fixture.create_log("beta.log", &sample_data::failing_log("beta", "7")).unwrap();

    runner.expect_exit(&[
        "parse",
        &fixture.path_str("alpha.log"),
        &fixture.path_str("beta.log"),
        "--output",
        &fixture.path_str("first.json"),
    ]);
    runner.expect_exit(&["parse", &fixture.path_str("first.json"), "--output", &fixture.path_str("second.json")]);
    runner.expect_exit(&[
        "parse",
        &fixture.path_str("first.json"),
        "--csv",
        "--output",
        &fixture.path_str("first.csv"),
    ]);
    runner.expect_exit(&["parse", &fixture.path_str("first.csv"), "--output", &fixture.path_str("third.json")]);

    let first = assertions::read_snapshot(&fixture.root().join("first.json")).unwrap();
    let second = assertions::read_snapshot(&fixture.root().join("second.json")).unwrap();
    assert_eq!(first, second);

    // listing fields are not carried by tables and come back as defaults
    let third = assertions::read_snapshot(&fixture.root().join("third.json")).unwrap();
    assert_eq!(third["beta"]["count"], Value::Int(7));
    assert_eq!(third["alpha"]["status"], Value::from("pass"));
}

#[test]
fn test_parse_merges_later_sources_over_earlier() {
    let runner = CliTestRunner::new().unwrap();
    let fixture = runner.fixture();
    fixture.create_log("first.log", &sample_data::log("alpha", "1")).unwrap();
    fixture.create_log("second.log", &sample_data::log("alpha", "2")).unwrap();
    let output = fixture.path_str("out.json");

    runner.expect_exit(&[
        "parse",
        &fixture.path_str("first.log"),
        &fixture.path_str("second.log"),
        "--output",
        &output,
    ]);

    let records = assertions::read_snapshot(&fixture.root().join("out.json")).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records["alpha"]["count"], Value::Int(2));
}

#[test]
fn test_parse_without_schema_fails() {
    let runner = CliTestRunner::new().unwrap();
    let log = runner.fixture().create_log("alpha.log", &sample_data::log("alpha", "1")).unwrap();

    let err = runner.run_raw(&["parse", &log.to_string_lossy()]).unwrap_err();
    assert!(matches!(err, LogdiffError::InvalidInput { .. }));
    assert_eq!(err.exit_code(), 255);
}
