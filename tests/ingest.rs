mod common;

use std::path::Path;

use covdelta::error::CovdeltaError;
use covdelta::model::{CoverageCounter, Metric};

#[test]
fn ingest_fixture_with_workdir() {
    let (_dir, paths) = common::write_reports(&[("current.json", common::CURRENT)]);

    let snapshot = covdelta::ingest::ingest(&paths[0], Some(Path::new(common::WORKDIR))).unwrap();

    let files: Vec<&str> = snapshot.files().keys().map(String::as_str).collect();
    assert_eq!(files, vec!["index.js", "src/a/x.js", "src/a/z.js"]);

    let dirs: Vec<&str> = snapshot.directories().keys().map(String::as_str).collect();
    assert_eq!(dirs, vec![".", "src/a"]);

    let x = &snapshot.file("src/a/x.js").unwrap().summary;
    assert_eq!(x.statements, CoverageCounter::new(3, 4));
    assert_eq!(x.branches, CoverageCounter::new(1, 2));
    assert_eq!(x.functions, CoverageCounter::new(1, 2));
    assert_eq!(x.lines, CoverageCounter::new(3, 3));

    // Wrapped in a `data` key in the raw report.
    let index = &snapshot.file("index.js").unwrap().summary;
    assert_eq!(index.statements, CoverageCounter::new(1, 1));

    let src_a = &snapshot.directory("src/a").unwrap().summary;
    assert_eq!(src_a.statements, CoverageCounter::new(3, 6));
    assert_eq!(src_a.lines, CoverageCounter::new(3, 5));

    let project = snapshot.project();
    assert_eq!(project.statements, CoverageCounter::new(4, 7));
    assert_eq!(project.lines, CoverageCounter::new(4, 6));
    assert!((snapshot.coverage_pct() - 400.0 / 7.0).abs() < 1e-9);
}

#[test]
fn ingest_fixture_run_metadata() {
    let snapshot = common::snapshot(common::CURRENT);
    let run = snapshot.run();

    assert!(!run.success);
    assert_eq!(run.num_total_tests, 4);
    assert_eq!(run.num_failed_tests, 1);
    assert_eq!(run.num_total_test_suites, 2);
    assert_eq!(run.snapshot.matched, 2);
    assert_eq!(run.test_results.len(), 2);
    assert!((run.elapsed_secs() - 1.25).abs() < 1e-9);

    let failed: Vec<_> = run.failed_assertions().map(|(_, a)| a.title.as_str()).collect();
    assert_eq!(failed, vec!["rejects empty input"]);
}

#[test]
fn ingest_without_workdir_keeps_absolute_paths() {
    let snapshot = covdelta::ingest::ingest_bytes(common::CURRENT.as_bytes(), None).unwrap();

    assert!(snapshot.file("/repo/src/a/x.js").is_some());
    assert!(snapshot.directory("/repo/src/a").is_some());
    assert!(snapshot.directory("/repo").is_some());
}

#[test]
fn ingest_report_without_coverage() {
    let snapshot = common::snapshot(r#"{ "success": true, "numTotalTests": 0 }"#);

    assert!(snapshot.files().is_empty());
    assert!(snapshot.directories().is_empty());
    for metric in Metric::ALL {
        assert_eq!(*snapshot.project().counter(metric), CoverageCounter::default());
    }
    assert!(snapshot.coverage_pct().is_nan());
    assert_eq!(snapshot.run().elapsed_secs(), 0.0);
}

#[test]
fn ingest_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = covdelta::ingest::ingest(&dir.path().join("nope.json"), None).unwrap_err();
    assert!(matches!(err, CovdeltaError::Io(_)));
}

#[test]
fn ingest_malformed_reports() {
    let invalid = covdelta::ingest::ingest_bytes(b"{ not json", None).unwrap_err();
    assert!(matches!(invalid, CovdeltaError::Json(_)));

    let not_object = covdelta::ingest::ingest_bytes(b"[1, 2]", None).unwrap_err();
    assert!(matches!(not_object, CovdeltaError::Parse(_)));

    let bad_entry =
        covdelta::ingest::ingest_bytes(br#"{ "success": true, "coverageMap": { "a.js": 3 } }"#, None)
            .unwrap_err();
    assert!(matches!(bad_entry, CovdeltaError::Parse(_)));
}
