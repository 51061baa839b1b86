// tests/cli_tests.rs
//
// Black-box runs of the `sable` binary.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn sable() -> Command {
    Command::cargo_bin("sable").expect("binary builds")
}

#[test]
fn check_reports_ok_for_a_valid_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("good.sbl");
    fs::write(&file, "{ a = 1; b = a: a; }").unwrap();

    sable()
        .arg("check")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains(": ok"));
}

#[test]
fn check_fails_with_a_diagnostic_for_a_broken_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("bad.sbl");
    fs::write(&file, "{ a = ; }").unwrap();

    sable()
        .arg("check")
        .arg(&file)
        .assert()
        .failure()
        .stderr(predicate::str::contains("syntax error"));
}

#[test]
fn ast_prints_the_pretty_tree() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("expr.sbl");
    fs::write(&file, "a ++ b ++ c").unwrap();

    sable()
        .arg("ast")
        .arg(&file)
        .assert()
        .success()
        .stdout(predicate::str::contains("(a ++ (b ++ c))"));
}

#[test]
fn ast_json_emits_serialized_nodes() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("expr.sbl");
    fs::write(&file, "{ answer = 42; }").unwrap();

    sable()
        .arg("ast")
        .arg(&file)
        .arg("--json")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"answer\""))
        .stdout(predicate::str::contains("42"));
}

#[test]
fn missing_files_exit_nonzero() {
    sable()
        .arg("check")
        .arg("/no/such/file.sbl")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot"));
}
