//! In-memory representation of one test run's coverage: counters, per-file
//! summaries, directory rollups and the run metadata they came with.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::AddAssign;

use crate::parsers::jest::RunMetadata;

/// Compute a coverage percentage, returning NaN when the total is zero.
#[must_use]
pub fn percent(covered: u64, total: u64) -> f64 {
    if total == 0 {
        f64::NAN
    } else {
        100.0 * covered as f64 / total as f64
    }
}

/// The four counters tracked per entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Metric {
    Statements,
    Branches,
    Functions,
    Lines,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Statements,
        Metric::Branches,
        Metric::Functions,
        Metric::Lines,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Statements => "statements",
            Metric::Branches => "branches",
            Metric::Functions => "functions",
            Metric::Lines => "lines",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A covered/total pair. Valid counters satisfy `covered <= total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageCounter {
    pub covered: u64,
    pub total: u64,
}

impl CoverageCounter {
    pub fn new(covered: u64, total: u64) -> Self {
        Self { covered, total }
    }

    #[must_use]
    pub fn pct(&self) -> f64 {
        percent(self.covered, self.total)
    }

    pub fn is_valid(&self) -> bool {
        self.covered <= self.total
    }
}

impl AddAssign for CoverageCounter {
    fn add_assign(&mut self, rhs: Self) {
        self.covered += rhs.covered;
        self.total += rhs.total;
    }
}

/// Statement, branch, function and line counters for one entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoverageSummary {
    pub statements: CoverageCounter,
    pub branches: CoverageCounter,
    pub functions: CoverageCounter,
    pub lines: CoverageCounter,
}

impl CoverageSummary {
    pub fn counter(&self, metric: Metric) -> &CoverageCounter {
        match metric {
            Metric::Statements => &self.statements,
            Metric::Branches => &self.branches,
            Metric::Functions => &self.functions,
            Metric::Lines => &self.lines,
        }
    }

    #[must_use]
    pub fn pct(&self, metric: Metric) -> f64 {
        self.counter(metric).pct()
    }

    /// Add every counter of `other` into `self`.
    pub fn merge(&mut self, other: &CoverageSummary) {
        self.statements += other.statements;
        self.branches += other.branches;
        self.functions += other.functions;
        self.lines += other.lines;
    }

    /// The first metric whose counter has `covered > total`, if any.
    pub fn invalid_metric(&self) -> Option<Metric> {
        Metric::ALL
            .into_iter()
            .find(|m| !self.counter(*m).is_valid())
    }
}

/// Coverage of a single source file, keyed by its project-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: String,
    pub summary: CoverageSummary,
}

impl FileEntry {
    /// Directory key of this file: the path without its last segment, or
    /// `"."` for files at the project root.
    pub fn directory(&self) -> &str {
        directory_of(&self.path)
    }

    /// Last path segment.
    pub fn file_name(&self) -> &str {
        match self.path.rfind('/') {
            Some(idx) => &self.path[idx + 1..],
            None => &self.path,
        }
    }
}

/// Directory key for a project-relative path.
pub fn directory_of(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(idx) => &path[..idx],
        None => ".",
    }
}

/// Rollup of the files whose immediate parent is `path`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub path: String,
    pub summary: CoverageSummary,
}

/// Aggregated result of one test run. Built by [`crate::aggregate`];
/// read-only afterwards so the rollup invariants always hold.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub(crate) project: CoverageSummary,
    pub(crate) files: BTreeMap<String, FileEntry>,
    pub(crate) directories: BTreeMap<String, DirectoryEntry>,
    pub(crate) run: RunMetadata,
}

impl Snapshot {
    /// Project-wide totals: the merge of every file summary.
    pub fn project(&self) -> &CoverageSummary {
        &self.project
    }

    pub fn files(&self) -> &BTreeMap<String, FileEntry> {
        &self.files
    }

    pub fn directories(&self) -> &BTreeMap<String, DirectoryEntry> {
        &self.directories
    }

    pub fn file(&self, path: &str) -> Option<&FileEntry> {
        self.files.get(path)
    }

    pub fn directory(&self, path: &str) -> Option<&DirectoryEntry> {
        self.directories.get(path)
    }

    pub fn run(&self) -> &RunMetadata {
        &self.run
    }

    /// Statement coverage of the whole project, NaN when nothing was
    /// instrumented.
    #[must_use]
    pub fn coverage_pct(&self) -> f64 {
        self.project.statements.pct()
    }
}
