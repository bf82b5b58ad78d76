//! Edge case integration tests for the minsync CLI.
//!
//! These tests cover length changes and boundary conditions:
//! - Empty source or destination
//! - Source longer or shorter than the destination
//! - Lengths that are not a multiple of the block size
//! - Tiny queues and blocks

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestFixture, noise, parse_summary};
use std::fs;

#[test]
fn test_empty_source_truncates_destination() {
    let fixture = TestFixture::new(b"", &noise(1024 * 1024, 1));

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(fs::metadata(&fixture.dst).unwrap().len(), 0);
    let (read, written, ratio) = parse_summary(&output.stdout);
    assert_eq!((read, written), (0, 0));
    assert_eq!(ratio, 0.0);
}

#[test]
fn test_empty_destination_is_filled() {
    let fixture = TestFixture::new(&noise(10_000, 2), b"");

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (_, written, _) = parse_summary(&output.stdout);
    assert_eq!(written, 10_000);
    fixture.assert_synced();
}

#[test]
fn test_unaligned_source_extends_destination() {
    let source = noise(1024 * 1024 + 1024, 3);
    let fixture = TestFixture::new(&source, &source[..1024 * 1024]);

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (_, written, _) = parse_summary(&output.stdout);
    assert_eq!(written, 1024);
    fixture.assert_synced();
}

#[test]
fn test_longer_destination_is_truncated() {
    let source = noise(8192, 4);
    let mut destination = source.clone();
    destination.extend(noise(5000, 5));
    let fixture = TestFixture::new(&source, &destination);

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (_, written, _) = parse_summary(&output.stdout);
    assert_eq!(written, 0);
    fixture.assert_synced();
}

#[test]
fn test_single_byte_file() {
    let fixture = TestFixture::new(b"a", b"b");

    cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success();

    fixture.assert_synced();
}

#[test]
fn test_queue_depth_one() {
    let fixture = TestFixture::new(&noise(200_000, 6), &noise(200_000, 7));

    cargo_bin_cmd!("minsync")
        .args(["--queue-depth", "1", "--block-size", "512"])
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success();

    fixture.assert_synced();
}

#[test]
fn test_same_file_on_both_sides() {
    let fixture = TestFixture::new(&noise(20_000, 8), b"");

    let output = cargo_bin_cmd!("minsync")
        .arg(&fixture.src)
        .arg(&fixture.src)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (read, written, _) = parse_summary(&output.stdout);
    assert_eq!((read, written), (20_000, 0));
    assert_eq!(fs::read(&fixture.src).unwrap(), noise(20_000, 8));
}
