//! Builds a [`Snapshot`] from per-file coverage summaries: every file is
//! rolled up into its immediate parent directory and into the project total.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::error::{CovdeltaError, Result};
use crate::model::{directory_of, CoverageSummary, DirectoryEntry, FileEntry, Snapshot};
use crate::parsers::jest::RunMetadata;

/// Accumulates file summaries and produces the finished snapshot.
#[derive(Debug, Default)]
pub struct Aggregator {
    files: BTreeMap<String, FileEntry>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one file. A path that was already added is replaced.
    ///
    /// Fails when any counter reports more covered items than it has.
    pub fn add(&mut self, path: impl Into<String>, summary: CoverageSummary) -> Result<()> {
        let path = path.into();
        if let Some(metric) = summary.invalid_metric() {
            let counter = summary.counter(metric);
            return Err(CovdeltaError::InvalidCounter {
                path,
                metric: metric.as_str(),
                covered: counter.covered,
                total: counter.total,
            });
        }

        let entry = FileEntry {
            path: path.clone(),
            summary,
        };
        if self.files.insert(path.clone(), entry).is_some() {
            warn!("Coverage for '{path}' reported more than once; keeping the latest entry");
        }
        Ok(())
    }

    /// Compute the directory and project rollups from the recorded files.
    pub fn finish(self, run: RunMetadata) -> Snapshot {
        let mut project = CoverageSummary::default();
        let mut directories: BTreeMap<String, DirectoryEntry> = BTreeMap::new();

        for file in self.files.values() {
            let dir = directory_of(&file.path);
            directories
                .entry(dir.to_string())
                .or_insert_with(|| DirectoryEntry {
                    path: dir.to_string(),
                    summary: CoverageSummary::default(),
                })
                .summary
                .merge(&file.summary);
            project.merge(&file.summary);
        }

        debug!(
            "Aggregated {} files into {} directories",
            self.files.len(),
            directories.len()
        );

        Snapshot {
            project,
            files: self.files,
            directories,
            run,
        }
    }
}

/// Aggregate a sequence of `(path, summary)` pairs into a snapshot.
pub fn build<I, P>(files: I, run: RunMetadata) -> Result<Snapshot>
where
    I: IntoIterator<Item = (P, CoverageSummary)>,
    P: Into<String>,
{
    let mut aggregator = Aggregator::new();
    for (path, summary) in files {
        aggregator.add(path, summary)?;
    }
    Ok(aggregator.finish(run))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CoverageCounter;

    fn stmts(covered: u64, total: u64) -> CoverageSummary {
        CoverageSummary {
            statements: CoverageCounter::new(covered, total),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_rolls_up_directories_and_project() {
        let snapshot = build(
            vec![
                ("a/x.js", stmts(8, 10)),
                ("a/y.js", stmts(1, 5)),
                ("b/z.js", stmts(2, 10)),
            ],
            RunMetadata::default(),
        )
        .unwrap();

        assert_eq!(snapshot.files().len(), 3);
        assert_eq!(snapshot.directories().len(), 2);
        assert_eq!(
            snapshot.directory("a").unwrap().summary.statements,
            CoverageCounter::new(9, 15)
        );
        assert_eq!(
            snapshot.directory("b").unwrap().summary.statements,
            CoverageCounter::new(2, 10)
        );
        assert_eq!(snapshot.project().statements, CoverageCounter::new(11, 25));
    }

    #[test]
    fn test_only_immediate_parent_is_rolled_up() {
        let snapshot = build(
            vec![("src/a.js", stmts(1, 1)), ("src/util/b.js", stmts(0, 1))],
            RunMetadata::default(),
        )
        .unwrap();

        assert_eq!(
            snapshot.directory("src").unwrap().summary.statements,
            CoverageCounter::new(1, 1)
        );
        assert_eq!(
            snapshot.directory("src/util").unwrap().summary.statements,
            CoverageCounter::new(0, 1)
        );
    }

    #[test]
    fn test_root_files_use_dot_directory() {
        let snapshot = build(vec![("index.js", stmts(1, 2))], RunMetadata::default()).unwrap();
        assert!(snapshot.directory(".").is_some());
    }

    #[test]
    fn test_duplicate_path_latest_wins() {
        let snapshot = build(
            vec![("a/x.js", stmts(1, 10)), ("a/x.js", stmts(4, 4))],
            RunMetadata::default(),
        )
        .unwrap();

        assert_eq!(snapshot.files().len(), 1);
        assert_eq!(
            snapshot.file("a/x.js").unwrap().summary.statements,
            CoverageCounter::new(4, 4)
        );
        assert_eq!(snapshot.project().statements, CoverageCounter::new(4, 4));
        assert_eq!(
            snapshot.directory("a").unwrap().summary.statements,
            CoverageCounter::new(4, 4)
        );
    }

    #[test]
    fn test_invalid_counter_is_rejected() {
        let err = build(vec![("a/x.js", stmts(5, 3))], RunMetadata::default()).unwrap_err();
        match err {
            CovdeltaError::InvalidCounter {
                path,
                metric,
                covered,
                total,
            } => {
                assert_eq!(path, "a/x.js");
                assert_eq!(metric, "statements");
                assert_eq!((covered, total), (5, 3));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input() {
        let snapshot = build(Vec::<(String, CoverageSummary)>::new(), RunMetadata::default())
            .unwrap();
        assert!(snapshot.files().is_empty());
        assert!(snapshot.coverage_pct().is_nan());
    }
}
