//! Basic functionality integration tests for the minsync CLI.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestFixture, noise, parse_summary};
use predicates::prelude::*;
use rstest::rstest;

#[test]
fn test_sync_changed_file() {
    let source = noise(64 * 1024, 1);
    let mut destination = source.clone();
    destination[10_000] ^= 0xFF;
    let fixture = TestFixture::new(&source, &destination);

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (read, written, _) = parse_summary(&output.stdout);
    assert_eq!(read, 64 * 1024);
    assert_eq!(written, 4096);
    fixture.assert_synced();
}

#[test]
fn test_identical_files_need_no_writes() {
    let data = noise(256 * 1024, 2);
    let fixture = TestFixture::new(&data, &data);

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (read, written, ratio) = parse_summary(&output.stdout);
    assert_eq!(read, 256 * 1024);
    assert_eq!(written, 0);
    assert_eq!(ratio, 0.0);
}

#[test]
fn test_second_run_writes_nothing() {
    let fixture = TestFixture::new(&noise(300_000, 3), &noise(120_000, 4));

    cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success();
    fixture.assert_synced();

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (_, written, _) = parse_summary(&output.stdout);
    assert_eq!(written, 0);
}

#[rstest]
#[case(1)]
#[case(512)]
#[case(4096)]
#[case(65536)]
#[case(1 << 20)]
fn test_block_sizes(#[case] block_size: usize) {
    let source = noise(100_000, 5);
    let mut destination = source.clone();
    destination[99_999] ^= 1;
    let fixture = TestFixture::new(&source, &destination);

    let output = cargo_bin_cmd!("minsync")
        .arg("--block-size")
        .arg(block_size.to_string())
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (_, written, _) = parse_summary(&output.stdout);
    let last_block = match 100_000 % block_size {
        0 => block_size,
        tail => tail,
    };
    assert_eq!(written, last_block.min(100_000) as u64);
    fixture.assert_synced();
}

#[test]
fn test_all_switches() {
    let fixture = TestFixture::new(&noise(50_000, 6), &vec![0u8; 70_000]);

    cargo_bin_cmd!("minsync")
        .args(["-b", "1024", "--queue-depth", "2"])
        .args(["--no-holes", "--no-read-ahead", "--no-sync"])
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success();

    fixture.assert_synced();
}

#[test]
fn test_quiet_prints_nothing() {
    let fixture = TestFixture::new(&noise(10_000, 7), &noise(10_000, 8));

    cargo_bin_cmd!("minsync")
        .arg("-q")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    fixture.assert_synced();
}

#[test]
fn test_progress_replaces_summary() {
    let fixture = TestFixture::new(&noise(10_000, 9), &noise(10_000, 10));

    cargo_bin_cmd!("minsync")
        .arg("--progress")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success()
        .stdout(predicate::str::contains("\t").not());

    fixture.assert_synced();
}

#[test]
fn test_verbose_logs_to_stderr() {
    let fixture = TestFixture::new(&noise(10_000, 11), &noise(10_000, 12));

    cargo_bin_cmd!("minsync")
        .arg("-v")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success()
        .stderr(predicate::str::contains("sync finished"));
}

#[test]
fn test_help() {
    cargo_bin_cmd!("minsync")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--block-size"))
        .stdout(predicate::str::contains("--profile"));
}
