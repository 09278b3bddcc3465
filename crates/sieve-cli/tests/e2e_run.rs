//! E2E tests for the `sieve` binary.

mod common;

use common::{sieve_cmd, write_file, TRACE};
use predicates::prelude::*;
use predicates::str::contains;

// ─── Successful runs ─────────────────────────────────────────────

#[test]
fn replays_trace_and_prints_reports() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    write_file(tmp.path(), "trace.jsonl", TRACE);
    let config = write_file(
        tmp.path(),
        "sieve.toml",
        r#"
        [source]
        label = "drive-test"
        trace = "trace.jsonl"

        [[analyzers]]
        name = "MsgCounter"

        [[analyzers]]
        name = "TypeFilter"
        args = ["LTE_RRC_OTA_Packet"]
        "#,
    );

    let output = sieve_cmd(tmp.path())
        .arg(&config)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let reports: Vec<serde_json::Value> = String::from_utf8(output)
        .expect("utf8 stdout")
        .lines()
        .map(|line| serde_json::from_str(line).expect("report line is JSON"))
        .collect();
    assert_eq!(reports.len(), 2);
    assert_eq!(reports[0]["analyzer"], "MsgCounter");
    assert_eq!(reports[0]["report"]["total"], 3);
    assert_eq!(reports[0]["report"]["by_type"]["LTE_RRC_OTA_Packet"], 2);
    assert_eq!(reports[1]["analyzer"], "TypeFilter");
    assert_eq!(reports[1]["report"]["passed"], 2);
    assert_eq!(reports[1]["report"]["dropped"], 1);
}

#[test]
fn config_path_falls_back_to_environment() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    write_file(tmp.path(), "trace.jsonl", TRACE);
    let config = write_file(
        tmp.path(),
        "custom.toml",
        "[source]\ntrace = \"trace.jsonl\"\n\n[[analyzers]]\nname = \"MsgCounter\"\n",
    );

    sieve_cmd(tmp.path())
        .env("SIEVE_CONFIG_PATH", &config)
        .assert()
        .success()
        .stdout(contains(r#""analyzer":"MsgCounter""#));
}

#[test]
fn missing_config_runs_with_defaults() {
    let tmp = tempfile::tempdir().expect("create temp dir");

    sieve_cmd(tmp.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(contains("no trace configured"));
}

#[test]
fn invalid_log_level_override_is_reported_after_logging_starts() {
    let tmp = tempfile::tempdir().expect("create temp dir");

    sieve_cmd(tmp.path())
        .env("SIEVE_LOG_LEVEL", "loud")
        .assert()
        .success()
        .stderr(contains("ignoring environment override"))
        .stderr(contains("SIEVE_LOG_LEVEL"))
        .stderr(contains("unknown severity: loud"));
}

#[test]
fn log_file_receives_analyzer_records() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    write_file(tmp.path(), "trace.jsonl", TRACE);
    let config = write_file(
        tmp.path(),
        "sieve.toml",
        r#"
        [logging]
        level = "info"
        path = "sieve.log"

        [source]
        trace = "trace.jsonl"

        [[analyzers]]
        name = "MsgLogger"
        args = [{ level = "warning", types = ["LTE_NAS_EMM_OTA_Incoming_Packet"] }]
        "#,
    );

    sieve_cmd(tmp.path())
        .arg(&config)
        .assert()
        .success()
        .stdout(contains(r#""logged":1"#));

    let log = std::fs::read_to_string(tmp.path().join("sieve.log")).expect("log file");
    let line = log
        .lines()
        .find(|l| l.contains("LTE_NAS_EMM_OTA_Incoming_Packet"))
        .expect("NAS record in log file");
    assert!(line.contains("WARN"));
    assert!(line.contains("MsgLogger"));
}

// ─── Failures ────────────────────────────────────────────────────

#[test]
fn unknown_analyzer_is_fatal() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let config = write_file(
        tmp.path(),
        "sieve.toml",
        "[[analyzers]]\nname = \"NoSuchAnalyzer\"\n",
    );

    sieve_cmd(tmp.path())
        .arg(&config)
        .assert()
        .failure()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(contains("NoSuchAnalyzer"))
        .stderr(contains("no_such_analyzer"));
}

#[test]
fn malformed_config_fails_before_logging() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    let config = write_file(tmp.path(), "sieve.toml", "[[analyzers]\n");

    sieve_cmd(tmp.path())
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains("failed to parse config file"));
}

#[test]
fn bad_trace_line_fails_the_run() {
    let tmp = tempfile::tempdir().expect("create temp dir");
    write_file(tmp.path(), "trace.jsonl", "{\"type_id\":\"A\"}\nnot json\n");
    let config = write_file(
        tmp.path(),
        "sieve.toml",
        "[source]\ntrace = \"trace.jsonl\"\n\n[[analyzers]]\nname = \"MsgCounter\"\n",
    );

    sieve_cmd(tmp.path())
        .arg(&config)
        .assert()
        .failure()
        .stderr(contains(":2: invalid event"));
}
