//! Pass/fail verdict of a run: the test run's own outcome combined with the
//! coverage-drop threshold against the baseline.

use log::warn;

use crate::diff;
use crate::model::Snapshot;
use crate::parsers::jest::RunMetadata;

/// Result of comparing the coverage change against the allowed minimum.
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub failed: bool,
    pub message: Option<String>,
}

impl GateOutcome {
    fn pass() -> Self {
        Self {
            failed: false,
            message: None,
        }
    }
}

/// Fail when coverage dropped by more than `min_delta_pct` percentage
/// points. Without a baseline percentage the gate never fails.
#[must_use]
pub fn evaluate(current_pct: f64, baseline_pct: Option<f64>, min_delta_pct: f64) -> GateOutcome {
    match baseline_pct {
        Some(baseline_pct) => check_delta(current_pct - baseline_pct, min_delta_pct),
        None => GateOutcome::pass(),
    }
}

/// [`evaluate`] on the project statement coverage of two snapshots.
#[must_use]
pub fn evaluate_snapshots(
    current: &Snapshot,
    baseline: Option<&Snapshot>,
    min_delta_pct: f64,
) -> GateOutcome {
    match diff::project_delta_pct(current, baseline) {
        Some(delta) => check_delta(delta, min_delta_pct),
        None => GateOutcome::pass(),
    }
}

fn check_delta(delta: f64, min_delta_pct: f64) -> GateOutcome {
    if delta.is_nan() || delta >= min_delta_pct {
        return GateOutcome::pass();
    }

    GateOutcome {
        failed: true,
        message: Some(format!(
            "Coverage changed by {delta:.1}% against the base branch, \
             below the allowed minimum of {min_delta_pct:.1}%"
        )),
    }
}

/// Overall outcome of a run plus every reason it failed.
#[derive(Debug, Clone, PartialEq)]
pub struct Verdict {
    pub passed: bool,
    pub errors: Vec<String>,
}

impl Verdict {
    /// Start from the test run's own result; a failed run is recorded as an
    /// error, not raised.
    pub fn from_run(run: &RunMetadata) -> Self {
        let mut verdict = Self {
            passed: true,
            errors: Vec::new(),
        };
        if !run.success {
            verdict.fail(format!(
                "Test run failed: {} of {} tests and {} of {} suites failed",
                run.num_failed_tests,
                run.num_total_tests,
                run.num_failed_test_suites + run.num_runtime_error_test_suites,
                run.num_total_test_suites
            ));
        }
        verdict
    }

    /// Record a failure reason and mark the run as failed.
    pub fn fail(&mut self, error: impl Into<String>) {
        self.passed = false;
        self.errors.push(error.into());
    }

    /// Fold a threshold gate result into the verdict.
    pub fn apply(&mut self, outcome: GateOutcome) {
        if !outcome.failed {
            return;
        }
        let message = outcome
            .message
            .unwrap_or_else(|| "Coverage threshold violated".to_string());
        warn!("{message}");
        self.fail(message);
    }
}
