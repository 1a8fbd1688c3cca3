//! Pairs coverage of the same entity across the current run and an
//! optional baseline run.

use crate::model::{CoverageSummary, Metric, Snapshot};

/// Something that has a coverage summary in a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    File(&'a str),
    Directory(&'a str),
    Project,
}

impl Entity<'_> {
    fn lookup(self, snapshot: &Snapshot) -> Option<&CoverageSummary> {
        match self {
            Entity::File(path) => snapshot.file(path).map(|f| &f.summary),
            Entity::Directory(path) => snapshot.directory(path).map(|d| &d.summary),
            Entity::Project => Some(snapshot.project()),
        }
    }
}

/// Current and baseline coverage of one entity. Built on demand while
/// rendering; never stored.
#[derive(Debug, Clone, Copy)]
pub struct DiffPair<'a> {
    pub current: &'a CoverageSummary,
    /// `None` when there is no baseline run or the entity is absent from it.
    pub baseline: Option<&'a CoverageSummary>,
    /// Whether a baseline run exists at all.
    pub compared: bool,
}

impl DiffPair<'_> {
    /// The entity exists now but not in the baseline run. Always false
    /// without a baseline run.
    pub fn is_new(&self) -> bool {
        self.compared && self.baseline.is_none()
    }

    /// Percentage-point change of `metric`, defined only when both sides
    /// have a numeric percentage.
    pub fn delta(&self, metric: Metric) -> Option<f64> {
        let baseline = self.baseline?;
        pct_delta(self.current.pct(metric), baseline.pct(metric))
    }
}

/// Look up `entity` in both snapshots. `None` when it is absent from the
/// current snapshot.
pub fn pair<'a>(
    entity: Entity<'_>,
    current: &'a Snapshot,
    baseline: Option<&'a Snapshot>,
) -> Option<DiffPair<'a>> {
    let current_summary = entity.lookup(current)?;
    Some(DiffPair {
        current: current_summary,
        baseline: baseline.and_then(|b| entity.lookup(b)),
        compared: baseline.is_some(),
    })
}

/// Signed change in project statement coverage against the baseline.
/// Undefined without a baseline or when either side has nothing
/// instrumented.
pub fn project_delta_pct(current: &Snapshot, baseline: Option<&Snapshot>) -> Option<f64> {
    pct_delta(current.coverage_pct(), baseline?.coverage_pct())
}

fn pct_delta(current: f64, baseline: f64) -> Option<f64> {
    if current.is_nan() || baseline.is_nan() {
        None
    } else {
        Some(current - baseline)
    }
}
