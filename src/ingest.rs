use std::path::Path;

use log::info;

use crate::aggregate;
use crate::error::Result;
use crate::model::Snapshot;
use crate::parsers::{istanbul, jest};

/// Read a Jest JSON report, summarise its coverage map and aggregate it
/// into a snapshot. Coverage paths under `workdir` are made relative to it.
pub fn ingest(report_path: &Path, workdir: Option<&Path>) -> Result<Snapshot> {
    let content = std::fs::read(report_path)?;
    let snapshot = ingest_bytes(&content, workdir)?;
    info!(
        "Ingested {}: {} files, {} directories",
        report_path.display(),
        snapshot.files().len(),
        snapshot.directories().len()
    );
    Ok(snapshot)
}

/// Same as [`ingest`], for a report already in memory.
pub fn ingest_bytes(content: &[u8], workdir: Option<&Path>) -> Result<Snapshot> {
    let report = jest::parse(content)?;

    let files = match &report.coverage_map {
        Some(map) => istanbul::summarize(map, workdir)?,
        None => Vec::new(),
    };

    aggregate::build(files, report.run)
}
