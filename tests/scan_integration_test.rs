//! End-to-end runs of the scan command against directories of CSV exports.

use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, contents: &[u8]) {
    fs::write(dir.join(name), contents).unwrap();
}

fn scan_json(dir: &Path, extra: &[&str]) -> Value {
    let output = Command::cargo_bin("table-keys")
        .unwrap()
        .args(["scan", dir.to_str().unwrap(), "--format", "json"])
        .args(extra)
        .output()
        .unwrap();
    assert!(
        output.status.success(),
        "scan failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout).unwrap()
}

#[test]
fn test_scan_outputs_every_table() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "users.csv", b"id,name\n1,alice\n2,bob\n");
    write(temp_dir.path(), "keys.csv", b"k1,k2,k3\n");
    write(temp_dir.path(), "empty.csv", b"");

    let tables = scan_json(temp_dir.path(), &[]);

    assert_eq!(
        tables,
        json!([
            {"name": "empty", "keys": [""]},
            {"name": "keys", "keys": ["k1", "k2", "k3"]},
            {"name": "users", "keys": ["id", "name"]},
        ])
    );
}

#[test]
fn test_scan_ignores_other_files_and_subdirectories() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "orders.csv", b"order_id,total\n");
    write(temp_dir.path(), "notes.txt", b"not,a,table\n");
    fs::create_dir(temp_dir.path().join("archive")).unwrap();
    write(&temp_dir.path().join("archive"), "old.csv", b"legacy\n");

    let tables = scan_json(temp_dir.path(), &[]);

    assert_eq!(tables, json!([{"name": "orders", "keys": ["order_id", "total"]}]));
}

#[test]
fn test_scan_degenerate_headers() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "a_no_newline.csv", b"x,y");
    write(temp_dir.path(), "b_blank_first_line.csv", b"\nid,name\n");
    write(temp_dir.path(), "c_gaps.csv", b"a,,b,\n");

    let tables = scan_json(temp_dir.path(), &[]);

    assert_eq!(
        tables,
        json!([
            {"name": "a_no_newline", "keys": ["x", "y"]},
            {"name": "b_blank_first_line", "keys": [""]},
            {"name": "c_gaps", "keys": ["a", "", "b", ""]},
        ])
    );
}

#[test]
fn test_scan_with_pattern_and_separator() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "events.tsv", b"ts\tkind\tpayload\n");
    write(temp_dir.path(), "ignored.csv", b"a,b\n");

    let tables = scan_json(
        temp_dir.path(),
        &["--pattern", "*.tsv", "--separator", "tab"],
    );

    assert_eq!(
        tables,
        json!([{"name": "events", "keys": ["ts", "kind", "payload"]}])
    );
}

#[test]
fn test_scan_small_chunks_match_default_chunks() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "wide.csv",
        b"alpha,beta,gamma,delta,epsilon,zeta,eta,theta\n1,2,3,4,5,6,7,8\n",
    );

    let default_chunks = scan_json(temp_dir.path(), &[]);
    let tiny_chunks = scan_json(temp_dir.path(), &["--chunk-size", "3"]);

    assert_eq!(default_chunks, tiny_chunks);
}

#[test]
fn test_scan_empty_directory() {
    let temp_dir = TempDir::new().unwrap();
    assert_eq!(scan_json(temp_dir.path(), &[]), json!([]));
}

#[test]
fn test_scan_fails_on_undecodable_header() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "good.csv", b"id\n");
    write(temp_dir.path(), "broken.csv", b"\xff\xfe\n");

    for policy in ["detach", "cancel"] {
        Command::cargo_bin("table-keys")
            .unwrap()
            .args([
                "scan",
                temp_dir.path().to_str().unwrap(),
                "--format",
                "json",
                "--on-failure",
                policy,
            ])
            .assert()
            .failure()
            .stdout(predicate::str::is_empty())
            .stderr(predicate::str::contains("table 'broken'"))
            .stderr(predicate::str::contains("not valid UTF-8"));
    }
}

#[test]
fn test_scan_fails_on_header_longer_than_limit() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "huge.csv", &[b'a'; 4096]);

    Command::cargo_bin("table-keys")
        .unwrap()
        .args([
            "scan",
            temp_dir.path().to_str().unwrap(),
            "--max-header-bytes",
            "1KiB",
            "--chunk-size",
            "512",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("table 'huge'"))
        .stderr(predicate::str::contains("no line terminator within the first 1024 bytes"));
}
