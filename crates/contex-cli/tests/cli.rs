//! CLI smoke tests.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help() {
    Command::cargo_bin("contex")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("process"))
        .stdout(predicate::str::contains("batch"));
}

#[test]
fn test_process_text_file_outputs_json() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("contract.txt");
    fs::write(
        &input,
        "Client: Acme Corp\nVendor: Widget Works\nTotal Due: 1,000.00 USD\nPayment Due: Net 30 days\n",
    )
    .unwrap();

    Command::cargo_bin("contex")
        .unwrap()
        .arg("process")
        .arg(&input)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"overall_score\""))
        .stdout(predicate::str::contains("total_due_amount"));
}

#[test]
fn test_process_missing_file_fails() {
    Command::cargo_bin("contex")
        .unwrap()
        .arg("process")
        .arg("does-not-exist.txt")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn test_batch_writes_results() {
    let dir = tempfile::tempdir().unwrap();
    let out = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a.txt"),
        "Client: Acme Corp\nTotal Due: 500.00 USD\n",
    )
    .unwrap();

    Command::cargo_bin("contex")
        .unwrap()
        .arg("batch")
        .arg(dir.path())
        .arg("--output-dir")
        .arg(out.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed, 0 failed"));

    assert!(out.path().join("a.json").exists());
}
