//! Error handling integration tests for the minsync CLI.
//!
//! These tests verify exit codes and error messages:
//! - Usage errors exit with 1
//! - Runtime errors exit with 2 and print `error[code]: message`
//! - Setup failures leave the destination untouched

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::TestFixture;
use predicates::prelude::*;
use std::fs;

#[test]
fn test_no_arguments_is_usage_error() {
    cargo_bin_cmd!("minsync")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_one_argument_is_usage_error() {
    let fixture = TestFixture::new(b"abc", b"abc");

    cargo_bin_cmd!("minsync").arg(&fixture.src).assert().code(1);
}

#[test]
fn test_three_arguments_is_usage_error() {
    let fixture = TestFixture::new(b"abc", b"abc");

    cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .arg(fixture.path("extra"))
        .assert()
        .code(1);
}

#[test]
fn test_unknown_flag_is_usage_error() {
    let fixture = TestFixture::new(b"abc", b"abc");

    cargo_bin_cmd!("minsync")
        .arg("--bogus")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .code(1);
}

#[test]
fn test_progress_and_quiet_conflict() {
    let fixture = TestFixture::new(b"abc", b"abc");

    cargo_bin_cmd!("minsync")
        .args(["-p", "-q"])
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .code(1);
}

#[test]
fn test_missing_source() {
    let fixture = TestFixture::new(b"abc", b"old");

    cargo_bin_cmd!("minsync")
        .arg(fixture.path("missing"))
        .arg(&fixture.dst)
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with("error[source_not_found]"));

    assert_eq!(fs::read(&fixture.dst).unwrap(), b"old");
}

#[test]
fn test_missing_destination_is_not_created() {
    let fixture = TestFixture::new(b"abc", b"old");
    let missing = fixture.path("missing");

    cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&missing)
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with("error[destination_not_found]"));

    assert!(!missing.exists());
}

#[test]
fn test_directory_source() {
    let fixture = TestFixture::new(b"abc", b"old");

    cargo_bin_cmd!("minsync")
        .arg(fixture.dir.path())
        .arg(&fixture.dst)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[invalid_input]"))
        .stderr(predicate::str::contains("is a directory"));
}

#[test]
fn test_directory_destination() {
    let fixture = TestFixture::new(b"abc", b"old");
    let dir = fixture.path("subdir");
    fs::create_dir(&dir).unwrap();

    cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&dir)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("error[invalid_input]"));

    assert!(dir.is_dir());
}

#[test]
fn test_zero_block_size() {
    let fixture = TestFixture::new(b"new content", b"old");

    cargo_bin_cmd!("minsync")
        .args(["--block-size", "0"])
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Invalid block size"));

    assert_eq!(fs::read(&fixture.dst).unwrap(), b"old");
}

#[test]
fn test_no_output_on_failure() {
    let fixture = TestFixture::new(b"abc", b"old");

    cargo_bin_cmd!("minsync")
        .arg(fixture.path("missing"))
        .arg(&fixture.dst)
        .assert()
        .failure()
        .stdout(predicate::str::is_empty());
}
