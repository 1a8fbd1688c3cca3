#![allow(dead_code)]

use std::path::{Path, PathBuf};

use covdelta::model::Snapshot;
use tempfile::TempDir;

/// Working directory the fixture reports were produced in.
pub const WORKDIR: &str = "/repo";

pub const CURRENT: &str = include_str!("../fixtures/current.json");
pub const BASELINE: &str = include_str!("../fixtures/baseline.json");

/// Write each `(name, content)` report into a fresh temporary directory.
/// The caller must hold onto `TempDir` to keep the files alive.
pub fn write_reports(reports: &[(&str, &str)]) -> (TempDir, Vec<PathBuf>) {
    let dir = tempfile::tempdir().unwrap();
    let paths = reports
        .iter()
        .map(|(name, content)| {
            let path = dir.path().join(name);
            std::fs::write(&path, content).unwrap();
            path
        })
        .collect();
    (dir, paths)
}

/// Ingest an in-memory report relative to [`WORKDIR`].
pub fn snapshot(content: &str) -> Snapshot {
    covdelta::ingest::ingest_bytes(content.as_bytes(), Some(Path::new(WORKDIR))).unwrap()
}
