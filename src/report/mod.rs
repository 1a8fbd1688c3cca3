//! Renders a coverage snapshot, optionally against a baseline, into the
//! markdown documents posted to the check run and to the pull request.

pub mod columns;
pub mod decorate;
pub mod table;
pub mod template;

use std::collections::HashSet;

use log::{debug, warn};

use crate::diff::{self, DiffPair, Entity};
use crate::gate::Verdict;
use crate::model::{FileEntry, Snapshot};
use crate::parsers::jest::RunMetadata;
use crate::severity::Color;

use columns::{columns_for, Column, DisplayMode};
use decorate::{join_words, Decorator};
use table::markdown_table;
use template::{Fields, Template};

/// Maximum length, in characters, of a pull-request comment body.
pub const COMMENT_BUDGET: usize = 65_535;

const TOTALS_LABEL: &str = "All Files";
const ALL_PASSED: &str = "All tests passed";

/// Sections kept in the comment document, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    /// Status, errors, counts and the totals table.
    SummaryOnly,
    /// Plus the per-test-file listing.
    SummaryAndTests,
    /// Plus the per-file coverage table.
    Full,
}

/// The two rendered documents.
#[derive(Debug, Clone)]
pub struct Documents {
    /// Every section, regardless of size.
    pub full: String,
    /// The largest layer that fits the comment budget.
    pub comment: String,
    pub comment_layer: Layer,
}

/// Report renderer configured with a column set, emphasis and a template.
#[derive(Debug, Clone)]
pub struct Renderer {
    columns: Vec<Column>,
    decorator: Decorator,
    template: Template,
    comment_budget: usize,
}

impl Renderer {
    pub fn new(mode: DisplayMode, colors: bool, template: Template) -> Self {
        Self {
            columns: columns_for(mode),
            decorator: Decorator::new(colors),
            template,
            comment_budget: COMMENT_BUDGET,
        }
    }

    /// Override the comment budget, e.g. to leave room for a marker that is
    /// added to the body later.
    #[must_use]
    pub fn with_comment_budget(mut self, budget: usize) -> Self {
        self.comment_budget = budget;
        self
    }

    /// Render both documents.
    pub fn render(
        &self,
        current: &Snapshot,
        baseline: Option<&Snapshot>,
        verdict: &Verdict,
    ) -> Documents {
        let summary = Fields {
            status: self.status(verdict),
            errors: self.errors(&verdict.errors),
            suites: self.suites(current.run()),
            tests: self.tests(current.run()),
            snapshots: self.snapshots(current.run()),
            time: self
                .decorator
                .text(&format!("{:.3}s", current.run().elapsed_secs()), Color::Default),
            summary_table: self.totals_table(current, baseline),
            ..Default::default()
        };
        let tests_review = self.tests_review(current.run());
        let details_table = self.details_table(current, baseline);

        let summary_only = self.template.fill(&summary);
        let with_tests = self.template.fill(&Fields {
            tests_review: tests_review.clone(),
            ..summary.clone()
        });
        let full = self.template.fill(&Fields {
            tests_review,
            details_table,
            ..summary
        });

        let (comment, comment_layer) = self.fit_comment(summary_only, with_tests, &full);
        debug!(
            "Rendered report: {} chars full, {} chars comment ({comment_layer:?})",
            full.chars().count(),
            comment.chars().count()
        );

        Documents {
            full,
            comment,
            comment_layer,
        }
    }

    /// Walk the layers from smallest to largest, stopping at the first one
    /// that no longer fits.
    fn fit_comment(&self, summary_only: String, with_tests: String, full: &str) -> (String, Layer) {
        let fits = |doc: &str| doc.chars().count() <= self.comment_budget;

        if !fits(&with_tests) {
            if !fits(&summary_only) {
                warn!(
                    "Report summary alone exceeds the comment budget of {} characters, truncating",
                    self.comment_budget
                );
                return (truncate_chars(&summary_only, self.comment_budget), Layer::SummaryOnly);
            }
            return (summary_only, Layer::SummaryOnly);
        }
        if !fits(full) {
            return (with_tests, Layer::SummaryAndTests);
        }
        (full.to_string(), Layer::Full)
    }

    fn header(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| self.decorator.text(c.title, Color::Default))
            .collect()
    }

    fn row(&self, label: &str, pair: &DiffPair<'_>) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.render(&self.decorator, label, pair))
            .collect()
    }

    fn new_marker(&self, pair: &DiffPair<'_>) -> String {
        if pair.is_new() {
            self.decorator.text("NEW", Color::Red)
        } else {
            String::new()
        }
    }

    /// Single-row table of the project totals.
    pub fn totals_table(&self, current: &Snapshot, baseline: Option<&Snapshot>) -> String {
        let mut rows = Vec::new();
        if let Some(pair) = diff::pair(Entity::Project, current, baseline) {
            let label = self.decorator.text(TOTALS_LABEL, Color::Default);
            rows.push(self.row(&label, &pair));
        }
        markdown_table(&self.header(), &rows)
    }

    /// Per-directory and per-file table. Files are grouped by directory;
    /// each directory row appears once, right before its first file.
    pub fn details_table(&self, current: &Snapshot, baseline: Option<&Snapshot>) -> String {
        let mut rows = Vec::new();
        let mut emitted: HashSet<&str> = HashSet::new();

        for file in sorted_files(current) {
            let dir = file.directory();
            if emitted.insert(dir) {
                if let Some(pair) = diff::pair(Entity::Directory(dir), current, baseline) {
                    let label = join_words([
                        self.new_marker(&pair),
                        self.decorator.text(dir, Color::Default),
                    ]);
                    rows.push(self.row(&label, &pair));
                }
            }

            if let Some(pair) = diff::pair(Entity::File(&file.path), current, baseline) {
                let label = join_words([
                    self.decorator.text("↳", Color::Grey),
                    self.new_marker(&pair),
                    self.decorator.text(file.file_name(), Color::Grey),
                ]);
                rows.push(self.row(&label, &pair));
            }
        }

        markdown_table(&self.header(), &rows)
    }

    fn status(&self, verdict: &Verdict) -> String {
        if verdict.passed {
            self.decorator.text("✔ PASS", Color::Green)
        } else {
            self.decorator.text("✖ FAIL", Color::Red)
        }
    }

    fn errors(&self, errors: &[String]) -> String {
        if errors.is_empty() {
            return self.decorator.text(ALL_PASSED, Color::Green);
        }
        errors
            .iter()
            .map(|e| format!("> {}", self.decorator.text(e, Color::Red)))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Comma-separated counts, skipping zero categories. The total is
    /// always shown.
    fn counts(&self, categories: &[(u64, &str, Color)], total: u64) -> String {
        categories
            .iter()
            .filter(|(n, _, _)| *n > 0)
            .map(|(n, name, color)| self.decorator.text(&format!("{n} {name}"), *color))
            .chain(std::iter::once(
                self.decorator.text(&format!("{total} total"), Color::Default),
            ))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn suites(&self, run: &RunMetadata) -> String {
        self.counts(
            &[
                (run.num_passed_test_suites, "passes", Color::Green),
                (run.num_pending_test_suites, "pendings", Color::Yellow),
                (
                    run.num_failed_test_suites + run.num_runtime_error_test_suites,
                    "fails",
                    Color::Red,
                ),
            ],
            run.num_total_test_suites,
        )
    }

    fn tests(&self, run: &RunMetadata) -> String {
        self.counts(
            &[
                (run.num_passed_tests, "passes", Color::Green),
                (run.num_pending_tests, "pendings", Color::Yellow),
                (run.num_todo_tests, "todos", Color::Yellow),
                (run.num_failed_tests, "fails", Color::Red),
            ],
            run.num_total_tests,
        )
    }

    fn snapshots(&self, run: &RunMetadata) -> String {
        let snapshot = &run.snapshot;
        self.counts(
            &[
                (snapshot.matched, "passes", Color::Green),
                (snapshot.updated, "updated", Color::Yellow),
                (snapshot.added, "written", Color::Yellow),
                (snapshot.unchecked, "obsolete", Color::Yellow),
                (snapshot.unmatched, "fails", Color::Red),
            ],
            snapshot.total,
        )
    }

    /// One quoted line per test file.
    fn tests_review(&self, run: &RunMetadata) -> String {
        let d = &self.decorator;
        let mut out = String::new();
        for test in &run.test_results {
            let line = match test.status.as_str() {
                "passed" => join_words([
                    d.text("● PASS:", Color::Green),
                    d.text(&test.name, Color::Grey),
                ]),
                "failed" => d.text(&format!("⬤ FAIL: {}", test.name), Color::Red),
                other => d.text(
                    &format!("⬤ {}: {}", other.to_uppercase(), test.name),
                    Color::Yellow,
                ),
            };
            out.push_str("\n\n> ");
            out.push_str(&line);
        }
        out
    }
}

/// First `max` characters of `text`, ending with a marker when cut.
fn truncate_chars(text: &str, max: usize) -> String {
    const MARKER: &str = "\n\n…";
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(MARKER.chars().count());
    match text.char_indices().nth(keep) {
        Some((end, _)) if max >= MARKER.chars().count() => format!("{}{MARKER}", &text[..end]),
        _ => text.chars().take(max).collect(),
    }
}

/// Files ordered by directory, then by file name.
fn sorted_files(snapshot: &Snapshot) -> Vec<&FileEntry> {
    let mut files: Vec<&FileEntry> = snapshot.files().values().collect();
    files.sort_by(|a, b| {
        a.directory()
            .cmp(b.directory())
            .then_with(|| a.file_name().cmp(b.file_name()))
            .then_with(|| a.path.cmp(&b.path))
    });
    files
}
