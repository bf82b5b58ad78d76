//! Runtime profile (`--profile`) integration tests for the minsync CLI.

#[path = "../common/mod.rs"]
mod common;

use assert_cmd::cargo::cargo_bin_cmd;
use common::{TestFixture, noise, parse_summary};
use predicates::prelude::*;
use serde_json::Value;
use std::fs;

#[test]
fn test_profile_written() {
    let source = noise(40_000, 1);
    let mut destination = source.clone();
    destination[0] ^= 1;
    let fixture = TestFixture::new(&source, &destination);
    let profile = fixture.path("profile.json");

    let output = cargo_bin_cmd!("minsync")
        .arg("--profile")
        .arg(&profile)
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .output()
        .unwrap();

    assert!(output.status.success());
    let (read, written, _) = parse_summary(&output.stdout);

    let json: Value = serde_json::from_str(&fs::read_to_string(&profile).unwrap()).unwrap();
    assert_eq!(json["schema_version"], "1.0");
    assert_eq!(json["stats"]["size"], 40_000);
    assert_eq!(json["stats"]["bytes_read"], read);
    assert_eq!(json["stats"]["bytes_written"], written);
    assert_eq!(json["stats"]["blocks"], 10);
    assert_eq!(json["stats"]["blocks_written"], 1);
    assert_eq!(json["options"]["block_size"], 4096);
    assert_eq!(json["options"]["fsync"], true);
    assert_eq!(json["queue_depth"], 32768);
    for phase in ["setup", "transfer", "flush", "total"] {
        assert!(json["timings_ms"][phase].as_f64().unwrap() >= 0.0);
    }
}

#[test]
fn test_profile_reflects_options() {
    let fixture = TestFixture::new(&noise(4096, 2), &noise(4096, 3));
    let profile = fixture.path("profile.json");

    cargo_bin_cmd!("minsync")
        .args(["-q", "-b", "1024", "--queue-depth", "7", "--no-holes", "--no-sync"])
        .arg("--profile")
        .arg(&profile)
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .success();

    let json: Value = serde_json::from_str(&fs::read_to_string(&profile).unwrap()).unwrap();
    assert_eq!(json["options"]["block_size"], 1024);
    assert_eq!(json["options"]["queue_depth"], 7);
    assert_eq!(json["options"]["punch_holes"], false);
    assert_eq!(json["options"]["fsync"], false);
    assert_eq!(json["queue_depth"], 7);
    assert_eq!(json["stats"]["sparse"], false);
}

#[test]
fn test_unwritable_profile_path() {
    let fixture = TestFixture::new(b"abc", b"abd");

    cargo_bin_cmd!("minsync")
        .arg("--profile")
        .arg(fixture.path("no/such/dir/profile.json"))
        .arg(&fixture.src)
        .arg(&fixture.dst)
        .assert()
        .code(2)
        .stderr(predicate::str::starts_with(
            "error[io_error]: Failed to write profile",
        ));
}

#[test]
fn test_no_profile_on_failure() {
    let fixture = TestFixture::new(b"abc", b"abd");
    let profile = fixture.path("profile.json");

    cargo_bin_cmd!("minsync")
        .arg("--profile")
        .arg(&profile)
        .arg(fixture.path("missing"))
        .arg(&fixture.dst)
        .assert()
        .code(2);

    assert!(!profile.exists());
}
