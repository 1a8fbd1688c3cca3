//! Command handler functions for the covdelta CLI.
//!
//! `cmd_render` and `cmd_summary` return their output as a `String`, making
//! them easy to test without capturing stdout.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _, Result};
use chrono::Utc;
use log::{info, warn};

use crate::config::Config;
use crate::gate::{self, Verdict};
use crate::github::{self, Context};
use crate::ingest::ingest;
use crate::model::{Metric, Snapshot};
use crate::report::{Documents, Renderer};
use crate::runner::{self, Git};

/// Options of the `run` command that only matter to orchestration.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Skip every GitHub API call.
    pub dry_run: bool,
    pub github_token: Option<String>,
    /// Directory receiving `report.md` and `comment.md`.
    pub out_dir: Option<PathBuf>,
}

/// Verdict of a run: the test outcome plus the coverage-delta gate.
fn judge(config: &Config, current: &Snapshot, baseline: Option<&Snapshot>) -> Verdict {
    let mut verdict = Verdict::from_run(current.run());
    verdict.apply(gate::evaluate_snapshots(current, baseline, config.min_delta));
    verdict
}

fn renderer(config: &Config, comment_budget: usize) -> Result<Renderer> {
    let template = config.load_template()?;
    Ok(Renderer::new(config.display_mode, config.colors, template).with_comment_budget(comment_budget))
}

/// Render a report file, optionally against a baseline report file, and
/// return either the full or the comment document.
pub fn cmd_render(
    config: &Config,
    report: &Path,
    baseline: Option<&Path>,
    comment: bool,
) -> Result<String> {
    let current = ingest(report, Some(&config.workdir))?;
    let baseline = baseline
        .map(|path| ingest(path, Some(&config.workdir)))
        .transpose()?;

    let verdict = judge(config, &current, baseline.as_ref());
    let documents = renderer(config, github::comment_budget())?.render(
        &current,
        baseline.as_ref(),
        &verdict,
    );

    Ok(if comment {
        documents.comment
    } else {
        documents.full
    })
}

/// Plain-text project totals for a report file.
pub fn cmd_summary(report: &Path) -> Result<String> {
    let snapshot = ingest(report, None)?;
    let run = snapshot.run();

    let mut out = String::new();
    writeln!(out, "Files:      {}", snapshot.files().len()).unwrap();
    for metric in Metric::ALL {
        let counter = snapshot.project().counter(metric);
        let label = format!("{}:", capitalize(metric.as_str()));
        writeln!(
            out,
            "{label:<12}{}/{} ({})",
            counter.covered,
            counter.total,
            format_rate(counter.pct())
        )
        .unwrap();
    }
    writeln!(
        out,
        "Tests:      {} passed, {} failed, {} total",
        run.num_passed_tests, run.num_failed_tests, run.num_total_tests
    )
    .unwrap();
    writeln!(out, "Result:     {}", if run.success { "passed" } else { "failed" }).unwrap();
    Ok(out)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn format_rate(pct: f64) -> String {
    if pct.is_nan() {
        "N/A".to_string()
    } else {
        format!("{pct:.1}%")
    }
}

/// Run the tests on the current checkout and, when a base branch is known,
/// on the base branch too; then judge, render, write and post the report.
pub fn cmd_run(config: &Config, options: &RunOptions) -> Result<Verdict> {
    let github = if options.dry_run {
        None
    } else {
        let token = options
            .github_token
            .clone()
            .context("A GitHub token is required unless --dry-run is set")?;
        Some(Context::from_env(token)?)
    };

    runner::run_tests(config)?;
    let current = ingest(&config.output_file, Some(&config.workdir))
        .with_context(|| format!("Failed to read {}", config.output_file.display()))?;

    let base_branch = config
        .base_branch
        .clone()
        .or_else(|| github.as_ref().and_then(|gh| gh.base_ref.clone()));
    let baseline = match base_branch {
        Some(branch) => baseline_run(config, &branch),
        None => {
            info!("No base branch configured, skipping baseline run");
            None
        }
    };

    let verdict = judge(config, &current, baseline.as_ref());
    let documents = renderer(config, github::comment_budget())?.render(
        &current,
        baseline.as_ref(),
        &verdict,
    );

    if let Some(dir) = &options.out_dir {
        write_documents(dir, &documents)?;
    }

    if let Some(gh) = github {
        let check = github::check_payload(
            &current,
            &config.workdir,
            &gh.head_sha,
            verdict.passed,
            &documents.full,
            Utc::now(),
        );
        gh.post_check(&check)?;

        match gh.pr_number {
            Some(pr) => gh.replace_comment(&github::comment_payload(pr, &documents.comment))?,
            None => info!("Not a pull request, skipping comment"),
        }
    } else {
        info!("Dry run, skipping GitHub API calls");
    }

    Ok(verdict)
}

/// Test run on the base branch. Any failure only costs the comparison.
fn baseline_run(config: &Config, branch: &str) -> Option<Snapshot> {
    let git = Git::new(&config.workdir);

    if let Err(e) = git.checkout_branch(branch) {
        warn!("Baseline run on '{branch}' unavailable: {e:#}");
        return None;
    }

    let result = runner::run_tests(config)
        .and_then(|()| ingest(&config.output_file, Some(&config.workdir)).map_err(Into::into));

    if let Err(e) = git.checkout_previous() {
        warn!("Failed to restore the previous checkout: {e:#}");
    }

    match result {
        Ok(snapshot) => Some(snapshot),
        Err(e) => {
            warn!("Baseline run on '{branch}' unavailable: {e:#}");
            None
        }
    }
}

fn write_documents(dir: &Path, documents: &Documents) -> Result<()> {
    if dir.exists() && !dir.is_dir() {
        bail!("{} is not a directory", dir.display());
    }
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create {}", dir.display()))?;
    for (name, body) in [("report.md", &documents.full), ("comment.md", &documents.comment)] {
        let path = dir.join(name);
        std::fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {}", path.display());
    }
    Ok(())
}
