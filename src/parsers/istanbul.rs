/// Summariser for the Istanbul coverage map embedded in Jest reports.
///
/// Reference: https://github.com/istanbuljs/istanbuljs
///
/// The map is a JSON object keyed by file path. Each value (optionally
/// wrapped in a `data` key) contains:
///   - `statementMap`: `{ "0": { "start": { "line": 1, "column": 0 }, "end": { ... } }, ... }`
///   - `s`:            `{ "0": 5, "1": 0, ... }` — hit counts per statement
///   - `branchMap`:    `{ "0": { "loc": ..., "type": "if", "locations": [...] }, ... }`
///   - `b`:            `{ "0": [5, 0], ... }` — hit counts per branch arm
///   - `fnMap`:        `{ "0": { "name": "foo", "decl": ..., "loc": ... }, ... }`
///   - `f`:            `{ "0": 3, ... }` — hit counts per function
use std::collections::HashMap;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{CovdeltaError, Result};
use crate::model::{CoverageCounter, CoverageSummary};

/// Summarise every file of an Istanbul coverage map, in map order.
///
/// Paths under `workdir` are made relative to it; anything else is kept as
/// reported.
pub fn summarize(
    coverage_map: &Value,
    workdir: Option<&Path>,
) -> Result<Vec<(String, CoverageSummary)>> {
    let files = coverage_map.as_object().ok_or_else(|| {
        CovdeltaError::Parse("coverageMap must be a JSON object keyed by file path".to_string())
    })?;

    files
        .iter()
        .map(|(path, entry)| {
            let summary = summarize_file(path, entry)?;
            Ok((relative_path(path, workdir), summary))
        })
        .collect()
}

/// Compute the four counters of one file entry.
pub fn summarize_file(path: &str, entry: &Value) -> Result<CoverageSummary> {
    let entry = entry.get("data").unwrap_or(entry);
    let entry = entry.as_object().ok_or_else(|| {
        CovdeltaError::Parse(format!("coverage entry for '{path}' is not an object"))
    })?;

    Ok(CoverageSummary {
        statements: count_hits(entry.get("s")),
        branches: count_branches(entry.get("b")),
        functions: count_hits(entry.get("f")),
        lines: count_lines(entry),
    })
}

/// Strip the working directory from an absolute report path.
pub fn relative_path(path: &str, workdir: Option<&Path>) -> String {
    workdir
        .and_then(|dir| Path::new(path).strip_prefix(dir).ok())
        .and_then(|rel| rel.to_str())
        .filter(|rel| !rel.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| path.to_string())
}

fn hit_count(value: &Value) -> u64 {
    value.as_u64().unwrap_or(0)
}

/// Counter over a `{ id: hits }` object (`s` or `f`).
fn count_hits(hits: Option<&Value>) -> CoverageCounter {
    let Some(hits) = hits.and_then(Value::as_object) else {
        return CoverageCounter::default();
    };
    let covered = hits.values().filter(|v| hit_count(v) > 0).count();
    CoverageCounter::new(covered as u64, hits.len() as u64)
}

/// Every arm of every branch counts once.
fn count_branches(b: Option<&Value>) -> CoverageCounter {
    let mut counter = CoverageCounter::default();
    let Some(b) = b.and_then(Value::as_object) else {
        return counter;
    };
    for arms in b.values().filter_map(Value::as_array) {
        counter.total += arms.len() as u64;
        counter.covered += arms.iter().filter(|v| hit_count(v) > 0).count() as u64;
    }
    counter
}

/// Lines are derived from statements: each statement's start line takes the
/// maximum hit count of the statements starting on it.
fn count_lines(entry: &Map<String, Value>) -> CoverageCounter {
    let (Some(stmt_map), Some(s)) = (
        entry.get("statementMap").and_then(Value::as_object),
        entry.get("s").and_then(Value::as_object),
    ) else {
        return CoverageCounter::default();
    };

    let mut line_hits: HashMap<u64, u64> = HashMap::new();
    for (idx, loc) in stmt_map {
        let Some(line) = loc
            .get("start")
            .and_then(|start| start.get("line"))
            .and_then(Value::as_u64)
        else {
            continue;
        };
        let count = s.get(idx.as_str()).map(hit_count).unwrap_or(0);
        line_hits
            .entry(line)
            .and_modify(|e| *e = (*e).max(count))
            .or_insert(count);
    }

    let covered = line_hits.values().filter(|&&hits| hits > 0).count();
    CoverageCounter::new(covered as u64, line_hits.len() as u64)
}
