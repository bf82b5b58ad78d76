//! Common test utilities for integration tests.

#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A test fixture holding a source and destination file in one temp dir.
pub struct TestFixture {
    pub dir: TempDir,
    pub src: PathBuf,
    pub dst: PathBuf,
}

impl TestFixture {
    /// Create a fixture with the given source and destination contents.
    pub fn new(source: &[u8], destination: &[u8]) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let src = dir.path().join("source.img");
        let dst = dir.path().join("destination.img");
        fs::write(&src, source).expect("Failed to write source");
        fs::write(&dst, destination).expect("Failed to write destination");
        Self { dir, src, dst }
    }

    /// Path of another file inside the fixture directory.
    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Assert that the destination now equals the source.
    pub fn assert_synced(&self) {
        let source = fs::read(&self.src).expect("Failed to read source");
        let destination = fs::read(&self.dst).expect("Failed to read destination");
        assert_eq!(source.len(), destination.len(), "Length mismatch");
        assert!(source == destination, "Content mismatch");
    }
}

/// Seeded random bytes.
pub fn noise(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill(&mut data[..]);
    data
}

/// Parse the tab-separated summary line into (read, written, ratio).
pub fn parse_summary(stdout: &[u8]) -> (u64, u64, f64) {
    let text = String::from_utf8(stdout.to_vec()).expect("Summary is not UTF-8");
    let fields: Vec<&str> = text.trim_end().split('\t').collect();
    assert_eq!(fields.len(), 4, "Unexpected summary: {text:?}");
    let read = fields[0].parse().expect("Bad read count");
    let written = fields[1].parse().expect("Bad write count");
    let ratio = fields[2]
        .trim_end_matches('%')
        .parse()
        .expect("Bad ratio");
    (read, written, ratio)
}

/// Allocated size in 512-byte units.
#[cfg(unix)]
pub fn allocated_blocks(path: &Path) -> u64 {
    use std::os::unix::fs::MetadataExt;
    fs::metadata(path).expect("Failed to stat").blocks()
}
