#![cfg(feature = "cli")]

use std::path::PathBuf;
use std::process::{Command, Output};

fn osod(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_osod"))
        .arg("--log-level")
        .arg("error")
        .args(args)
        .output()
        .expect("osod should run")
}

fn unique_temp_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "osod-cli-{tag}-{}-{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .expect("time should be after epoch")
            .as_nanos()
    ));
    std::fs::create_dir_all(&dir).expect("temp dir should be creatable");
    dir
}

#[test]
fn decode_prints_requested_state_as_json() {
    let output = osod(&["--format", "json", "decode", "02 00 00 80 3F 00 00 00 40"]);
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8(output.stdout).expect("stdout should be utf-8");
    let value: serde_json::Value =
        serde_json::from_str(stdout.trim()).expect("decode output should be JSON");
    assert_eq!(value["kind"], "RequestedState");
    assert_eq!(value["tag"], 2);
    assert_eq!(value["size"], 8);
    assert_eq!(value["fields"]["velocity"], 1.0);
    assert_eq!(value["fields"]["angular_velocity"], 2.0);
}

#[test]
fn decode_csv_prints_values_only() {
    let output = osod(&["--format", "csv", "decode", "01", "01"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "true");
}

#[test]
fn decode_unknown_tag_exits_failure() {
    let output = osod(&["decode", "09 00 00"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unrecognized tag: 9"), "stderr: {stderr}");
}

#[test]
fn decode_short_payload_exits_data_invalid() {
    let output = osod(&["decode", "03 00 00 00"]);
    assert_eq!(output.status.code(), Some(60));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("decode failed"), "stderr: {stderr}");
}

#[test]
fn decode_bad_hex_exits_data_invalid() {
    let output = osod(&["decode", "not-hex"]);
    assert_eq!(output.status.code(), Some(60));
}

#[test]
fn kinds_lists_every_payload_kind() {
    let output = osod(&["--format", "json", "kinds"]);
    assert_eq!(output.status.code(), Some(0));

    let value: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("kinds output should be JSON");
    let kinds = value.as_array().expect("kinds output should be an array");
    assert_eq!(kinds.len(), 4);

    let sizes: Vec<_> = kinds
        .iter()
        .map(|k| (k["tag"].as_u64().unwrap(), k["size"].as_u64().unwrap()))
        .collect();
    assert_eq!(sizes, vec![(1, 1), (2, 8), (3, 32), (4, 21)]);
    assert_eq!(kinds[3]["fields"].as_array().unwrap().len(), 9);
}

#[test]
fn version_reports_package_version() {
    let output = osod(&["version"]);
    assert_eq!(output.status.code(), Some(0));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        format!("osod {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn monitor_missing_port_exits_transport_error() {
    let dir = unique_temp_dir("missing-port");
    let port = dir.join("no-such-tty");
    let port = port.to_str().expect("temp path should be utf-8");

    let output = osod(&[
        "monitor",
        "--port",
        port,
        "--retry-interval",
        "10ms",
        "--max-attempts",
        "2",
        "--log-dir",
        dir.join("logs").to_str().expect("temp path should be utf-8"),
    ]);

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open failed"), "stderr: {stderr}");

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn monitor_rejects_zero_retry_interval() {
    let output = osod(&["monitor", "--retry-interval", "0s", "--max-attempts", "1"]);
    assert_eq!(output.status.code(), Some(64));
}
