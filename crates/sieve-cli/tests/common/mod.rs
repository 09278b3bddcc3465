//! Shared E2E test helpers for `sieve` binary tests.

use std::path::{Path, PathBuf};
use std::time::Duration;

use assert_cmd::cargo::cargo_bin_cmd;

/// Default timeout for one CLI run.
pub const TIMEOUT: Duration = Duration::from_secs(10);

const SIEVE_VARS: &[&str] = &[
    "SIEVE_CONFIG_PATH",
    "SIEVE_LOG_LEVEL",
    "SIEVE_LOG_PATH",
    "SIEVE_LOG_JSON",
    "SIEVE_TRACE_PATH",
];

/// Builds a `sieve` command isolated from the caller's `SIEVE_*` environment,
/// running inside `dir`.
pub fn sieve_cmd(dir: &Path) -> assert_cmd::Command {
    let mut cmd: assert_cmd::Command = cargo_bin_cmd!("sieve");
    cmd.timeout(TIMEOUT);
    for var in SIEVE_VARS {
        cmd.env_remove(var);
    }
    cmd.current_dir(dir);
    cmd
}

/// Writes `contents` to `dir/name` and returns the path.
pub fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write test file");
    path
}

/// A short trace with two RRC messages and one NAS message.
pub const TRACE: &str = r#"{"type_id":"LTE_RRC_OTA_Packet","timestamp":"2024-03-01T12:00:00Z","data":{"handover":true}}
{"type_id":"LTE_NAS_EMM_OTA_Incoming_Packet","timestamp":"2024-03-01T12:00:01Z"}
{"type_id":"LTE_RRC_OTA_Packet","timestamp":"2024-03-01T12:00:02Z"}
"#;
