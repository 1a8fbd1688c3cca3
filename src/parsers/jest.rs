/// Parser for the Jest `--json` results file.
///
/// Reference: https://jestjs.io/docs/cli#--json
///
/// The document is a single JSON object. Besides the suite/test counters it
/// carries:
///   - `success`:     overall pass/fail of the run
///   - `snapshot`:    `{ total, matched, unmatched, added, updated, ... }`
///   - `testResults`: one entry per test file, with per-assertion outcomes
///   - `coverageMap`: Istanbul per-file coverage (present with `--coverage`)
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CovdeltaError, Result};

/// Suite/test counts and per-test results of one run, read verbatim from
/// the report.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunMetadata {
    #[serde(default)]
    pub num_passed_test_suites: u64,
    #[serde(default)]
    pub num_failed_test_suites: u64,
    #[serde(default)]
    pub num_pending_test_suites: u64,
    #[serde(default)]
    pub num_runtime_error_test_suites: u64,
    #[serde(default)]
    pub num_total_test_suites: u64,
    #[serde(default)]
    pub num_passed_tests: u64,
    #[serde(default)]
    pub num_failed_tests: u64,
    #[serde(default)]
    pub num_pending_tests: u64,
    #[serde(default)]
    pub num_todo_tests: u64,
    #[serde(default)]
    pub num_total_tests: u64,
    pub success: bool,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub snapshot: SnapshotStats,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotStats {
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub matched: u64,
    #[serde(default)]
    pub unmatched: u64,
    #[serde(default)]
    pub added: u64,
    #[serde(default)]
    pub updated: u64,
    #[serde(default)]
    pub unchecked: u64,
    #[serde(default)]
    pub files_added: u64,
    #[serde(default)]
    pub files_removed: u64,
}

/// Outcome of one test file.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub name: String,
    #[serde(default)]
    pub start_time: i64,
    #[serde(default)]
    pub end_time: i64,
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub assertion_results: Vec<AssertionResult>,
}

impl TestResult {
    /// Wall time of this test file in milliseconds.
    pub fn duration_ms(&self) -> i64 {
        self.end_time.saturating_sub(self.start_time)
    }
}

/// Outcome of a single `it`/`test` block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionResult {
    pub title: String,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub ancestor_titles: Vec<String>,
    pub status: String,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub failure_messages: Vec<String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Location {
    pub line: u32,
    #[serde(default)]
    pub column: Option<u32>,
}

impl RunMetadata {
    /// Sum of every test file's duration, in seconds. Zero when there are
    /// no test results.
    pub fn elapsed_secs(&self) -> f64 {
        let total_ms = self
            .test_results
            .iter()
            .map(TestResult::duration_ms)
            .fold(0i64, i64::saturating_add);
        total_ms as f64 / 1000.0
    }

    /// Failed assertions paired with the test file that contains them.
    pub fn failed_assertions(&self) -> impl Iterator<Item = (&TestResult, &AssertionResult)> {
        self.test_results.iter().flat_map(|result| {
            result
                .assertion_results
                .iter()
                .filter(|a| a.status == "failed")
                .map(move |a| (result, a))
        })
    }
}

/// A parsed Jest report: the run metadata and the untouched coverage map.
#[derive(Debug, Clone)]
pub struct JestReport {
    pub run: RunMetadata,
    /// `None` when the run was not executed with `--coverage`.
    pub coverage_map: Option<Value>,
}

/// Parse a Jest JSON report from raw bytes.
pub fn parse(input: &[u8]) -> Result<JestReport> {
    let mut doc: Value = serde_json::from_slice(input)?;
    let obj = doc
        .as_object_mut()
        .ok_or_else(|| CovdeltaError::Parse("Jest report must be a JSON object".to_string()))?;

    let coverage_map = obj.remove("coverageMap").filter(|v| !v.is_null());
    let run: RunMetadata = serde_json::from_value(doc)?;

    Ok(JestReport { run, coverage_map })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "numPassedTestSuites": 1,
        "numFailedTestSuites": 1,
        "numTotalTestSuites": 2,
        "numPassedTests": 3,
        "numFailedTests": 1,
        "numTotalTests": 4,
        "success": false,
        "snapshot": { "total": 2, "matched": 2 },
        "testResults": [
            {
                "name": "/work/src/a.test.js",
                "startTime": 1000,
                "endTime": 1250,
                "status": "passed",
                "message": "",
                "assertionResults": [
                    { "title": "adds", "status": "passed", "location": { "line": 3, "column": 1 } }
                ]
            },
            {
                "name": "/work/src/b.test.js",
                "startTime": 2000,
                "endTime": 2500,
                "status": "failed",
                "message": "boom",
                "assertionResults": [
                    {
                        "title": "breaks",
                        "ancestorTitles": ["b"],
                        "status": "failed",
                        "location": null,
                        "failureMessages": ["Error: boom"]
                    }
                ]
            }
        ]
    }"#;

    #[test]
    fn test_parse_counts_and_results() {
        let report = parse(MINIMAL.as_bytes()).unwrap();
        let run = &report.run;
        assert!(!run.success);
        assert_eq!(run.num_total_test_suites, 2);
        assert_eq!(run.num_pending_tests, 0);
        assert_eq!(run.snapshot.total, 2);
        assert_eq!(run.test_results.len(), 2);
        assert!(report.coverage_map.is_none());
    }

    #[test]
    fn test_elapsed_secs() {
        let report = parse(MINIMAL.as_bytes()).unwrap();
        assert!((report.run.elapsed_secs() - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_elapsed_secs_saturates_on_extreme_timestamps() {
        let report = parse(
            format!(
                r#"{{
                "success": true,
                "testResults": [
                    {{ "name": "a", "status": "passed", "startTime": {min}, "endTime": {max} }},
                    {{ "name": "b", "status": "passed", "startTime": {min}, "endTime": {max} }}
                ]
            }}"#,
                min = i64::MIN,
                max = i64::MAX
            )
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(report.run.test_results[0].duration_ms(), i64::MAX);
        assert_eq!(report.run.elapsed_secs(), i64::MAX as f64 / 1000.0);
    }

    #[test]
    fn test_elapsed_secs_without_results_is_zero() {
        let report = parse(br#"{ "success": true }"#).unwrap();
        assert_eq!(report.run.elapsed_secs(), 0.0);
    }

    #[test]
    fn test_failed_assertions() {
        let report = parse(MINIMAL.as_bytes()).unwrap();
        let failed: Vec<_> = report.run.failed_assertions().collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].0.name, "/work/src/b.test.js");
        assert_eq!(failed[0].1.title, "breaks");
        assert!(failed[0].1.location.is_none());
    }

    #[test]
    fn test_coverage_map_is_split_off() {
        let report = parse(br#"{ "success": true, "coverageMap": { "a.js": {} } }"#).unwrap();
        assert!(report.coverage_map.unwrap().get("a.js").is_some());
    }

    #[test]
    fn test_missing_success_is_error() {
        assert!(parse(br#"{ "numTotalTests": 1 }"#).is_err());
    }

    #[test]
    fn test_not_an_object_is_error() {
        let err = parse(b"[1, 2]").unwrap_err();
        assert!(matches!(err, CovdeltaError::Parse(_)));
    }

    #[test]
    fn test_invalid_json_is_error() {
        let err = parse(b"{ not json").unwrap_err();
        assert!(matches!(err, CovdeltaError::Json(_)));
    }
}
