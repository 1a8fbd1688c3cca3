//! GitHub API helpers: check-run and pull-request comment payloads, and the
//! client that posts them.

use std::path::Path;

use anyhow::{bail, Context as _, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::model::Snapshot;
use crate::parsers::istanbul::relative_path;
use crate::report::COMMENT_BUDGET;

const API_URL: &str = "https://api.github.com";
const COMMENT_MARKER: &str = "<!-- covdelta-comment -->";
const CHECK_NAME: &str = "Coverage Report";
/// GitHub rejects check-run requests carrying more annotations than this.
const MAX_ANNOTATIONS: usize = 50;

/// Room left for the comment document once the marker line is prepended.
pub fn comment_budget() -> usize {
    COMMENT_BUDGET - COMMENT_MARKER.chars().count() - 1
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

/// A single annotation to attach to a GitHub check run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    /// Test file path relative to the working directory.
    pub path: String,
    /// 1-based line of the failing assertion, 0 when unknown.
    pub start_line: u32,
    pub end_line: u32,
    pub annotation_level: &'static str,
    /// Describe-block titles and the test title, joined with ` > `.
    pub title: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckOutput {
    pub title: String,
    pub summary: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckRunPayload {
    pub name: String,
    pub head_sha: String,
    pub status: &'static str,
    pub conclusion: &'static str,
    pub completed_at: String,
    pub output: CheckOutput,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentPayload {
    #[serde(skip)]
    pub issue_number: u64,
    pub body: String,
}

fn strip_ansi(text: &str) -> String {
    String::from_utf8_lossy(&strip_ansi_escapes::strip(text.as_bytes())).into_owned()
}

/// Annotations for every failed assertion. Empty for a successful run.
pub fn annotations(snapshot: &Snapshot, cwd: &Path) -> Vec<Annotation> {
    let run = snapshot.run();
    if run.success {
        return Vec::new();
    }
    run.failed_assertions()
        .map(|(result, assertion)| {
            let line = assertion.location.map(|l| l.line).unwrap_or(0);
            let title = assertion
                .ancestor_titles
                .iter()
                .chain(std::iter::once(&assertion.title))
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(" > ");
            Annotation {
                path: relative_path(&result.name, Some(cwd)),
                start_line: line,
                end_line: line,
                annotation_level: "failure",
                title,
                message: strip_ansi(&assertion.failure_messages.join("\n\n")),
            }
        })
        .collect()
}

/// Check-run body: the full report as summary, failure output and
/// annotations when the run failed.
pub fn check_payload(
    snapshot: &Snapshot,
    cwd: &Path,
    head_sha: &str,
    passed: bool,
    summary: &str,
    completed_at: DateTime<Utc>,
) -> CheckRunPayload {
    let run = snapshot.run();
    let text = (!run.success).then(|| {
        let messages = run
            .test_results
            .iter()
            .map(|r| strip_ansi(&r.message))
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        format!("```\n{}\n```", messages.trim_end())
    });

    CheckRunPayload {
        name: CHECK_NAME.to_string(),
        head_sha: head_sha.to_string(),
        status: "completed",
        conclusion: if passed { "success" } else { "failure" },
        completed_at: completed_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        output: CheckOutput {
            title: if passed { "Tests passed" } else { "Tests failed" }.to_string(),
            summary: summary.to_string(),
            text,
            annotations: annotations(snapshot, cwd),
        },
    }
}

pub fn comment_payload(pr_number: u64, body: &str) -> CommentPayload {
    CommentPayload {
        issue_number: pr_number,
        body: format!("{COMMENT_MARKER}\n{body}"),
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct Event {
    pull_request: Option<PullRequest>,
}

#[derive(Deserialize)]
struct PullRequest {
    number: u64,
    head: GitRef,
    base: GitRef,
}

#[derive(Deserialize)]
struct GitRef {
    sha: Option<String>,
    #[serde(rename = "ref")]
    name: Option<String>,
}

#[derive(Deserialize)]
struct Created {
    id: u64,
}

#[derive(Deserialize)]
struct Comment {
    id: u64,
    body: Option<String>,
}

/// Resolved GitHub Actions context, read from environment variables and
/// the event payload.
pub struct Context {
    token: String,
    repo: String,
    pub pr_number: Option<u64>,
    pub head_sha: String,
    pub base_ref: Option<String>,
}

impl Context {
    /// Build a context from `GITHUB_REPOSITORY`, `GITHUB_SHA`,
    /// `GITHUB_EVENT_PATH` and `GITHUB_REF`.
    pub fn from_env(token: String) -> Result<Self> {
        let repo = std::env::var("GITHUB_REPOSITORY")
            .context("GITHUB_REPOSITORY environment variable is required")?;
        let sha = std::env::var("GITHUB_SHA").context("GITHUB_SHA environment variable is required")?;

        let pull_request = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) => read_event(Path::new(&path))?.pull_request,
            Err(_) => None,
        };

        let (pr_number, head_sha, base_ref) = match pull_request {
            Some(pr) => (Some(pr.number), pr.head.sha.unwrap_or(sha), pr.base.name),
            None => (pr_number_from_ref(), sha, None),
        };

        Ok(Self {
            token,
            repo,
            pr_number,
            head_sha,
            base_ref,
        })
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        ureq::request(method, &format!("{API_URL}/repos/{}/{path}", self.repo))
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", "application/vnd.github+json")
            .set("User-Agent", "covdelta")
            .set("X-GitHub-Api-Version", "2022-11-28")
    }

    /// Create the check run. Annotations beyond the per-request limit are
    /// sent in follow-up updates.
    pub fn post_check(&self, payload: &CheckRunPayload) -> Result<()> {
        let mut chunks = payload.output.annotations.chunks(MAX_ANNOTATIONS);

        let mut first = payload.clone();
        first.output.annotations = chunks.next().map(<[_]>::to_vec).unwrap_or_default();
        let resp = send(self.request("POST", "check-runs"), &first, "creating check run")?;
        let created: Created = resp
            .into_json()
            .context("Failed to parse check run response")?;

        for chunk in chunks {
            let update = serde_json::json!({
                "output": {
                    "title": payload.output.title,
                    "summary": payload.output.summary,
                    "annotations": chunk,
                }
            });
            send(
                self.request("PATCH", &format!("check-runs/{}", created.id)),
                &update,
                "updating check run",
            )?;
        }

        info!("Check run {} created on {}", created.id, payload.head_sha);
        Ok(())
    }

    /// Delete previous report comments on the pull request and post a new
    /// one.
    pub fn replace_comment(&self, payload: &CommentPayload) -> Result<()> {
        let issue = payload.issue_number;
        for id in self.find_comments(issue)? {
            debug!("Deleting previous comment {id}");
            send_empty(
                self.request("DELETE", &format!("issues/comments/{id}")),
                "deleting comment",
            )?;
        }

        send(
            self.request("POST", &format!("issues/{issue}/comments")),
            payload,
            "creating comment",
        )?;
        info!("Comment posted to {}/pull/{issue}", self.repo);
        Ok(())
    }

    /// Ids of every comment on the issue carrying our marker.
    fn find_comments(&self, issue: u64) -> Result<Vec<u64>> {
        let mut ids = Vec::new();
        let mut page = 1u32;
        loop {
            let resp = self
                .request("GET", &format!("issues/{issue}/comments"))
                .query("per_page", "100")
                .query("page", &page.to_string())
                .call()
                .context("Failed to list PR comments")?;

            let comments: Vec<Comment> = resp.into_json().context("Failed to parse comments JSON")?;
            if comments.is_empty() {
                break;
            }
            ids.extend(
                comments
                    .iter()
                    .filter(|c| c.body.as_deref().is_some_and(|b| b.contains(COMMENT_MARKER)))
                    .map(|c| c.id),
            );
            page += 1;
        }
        Ok(ids)
    }
}

fn read_event(path: &Path) -> Result<Event> {
    let content = std::fs::read(path)
        .with_context(|| format!("Failed to read event payload {}", path.display()))?;
    serde_json::from_slice(&content).context("Failed to parse event payload")
}

/// Extract PR number from GITHUB_REF (e.g. "refs/pull/42/merge" → 42).
fn pr_number_from_ref() -> Option<u64> {
    parse_pr_ref(&std::env::var("GITHUB_REF").ok()?)
}

fn parse_pr_ref(github_ref: &str) -> Option<u64> {
    let parts: Vec<&str> = github_ref.split('/').collect();
    if parts.len() >= 3 && parts[0] == "refs" && parts[1] == "pull" {
        parts[2].parse().ok()
    } else {
        None
    }
}

fn send(req: ureq::Request, body: &impl Serialize, action: &str) -> Result<ureq::Response> {
    match req.send_json(body) {
        Ok(resp) => Ok(resp),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            bail!("GitHub API error {action} (HTTP {code}): {body}");
        }
        Err(e) => bail!("Failed {action}: {e}"),
    }
}

fn send_empty(req: ureq::Request, action: &str) -> Result<()> {
    match req.call() {
        Ok(_) => Ok(()),
        Err(ureq::Error::Status(code, resp)) => {
            let body = resp.into_string().unwrap_or_default();
            bail!("GitHub API error {action} (HTTP {code}): {body}");
        }
        Err(e) => bail!("Failed {action}: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ingest_bytes;

    const FAILED_RUN: &str = r#"{
        "success": false,
        "numFailedTests": 1,
        "numTotalTests": 2,
        "testResults": [
            {
                "name": "/work/src/math.test.js",
                "startTime": 0,
                "endTime": 10,
                "status": "failed",
                "message": "\u001b[31mexpected 2\u001b[39m",
                "assertionResults": [
                    {
                        "title": "adds",
                        "ancestorTitles": ["math", "add"],
                        "status": "failed",
                        "location": { "line": 12, "column": 5 },
                        "failureMessages": ["\u001b[1mError\u001b[22m: one", "two"]
                    },
                    {
                        "title": "subtracts",
                        "status": "failed",
                        "failureMessages": []
                    },
                    { "title": "ok", "status": "passed" }
                ]
            }
        ]
    }"#;

    fn completed_at() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_annotations_for_failed_assertions() {
        let snapshot = ingest_bytes(FAILED_RUN.as_bytes(), None).unwrap();
        let annotations = annotations(&snapshot, Path::new("/work"));
        assert_eq!(annotations.len(), 2);

        assert_eq!(annotations[0].path, "src/math.test.js");
        assert_eq!(annotations[0].start_line, 12);
        assert_eq!(annotations[0].end_line, 12);
        assert_eq!(annotations[0].title, "math > add > adds");
        assert_eq!(annotations[0].message, "Error: one\n\ntwo");

        assert_eq!(annotations[1].start_line, 0);
        assert_eq!(annotations[1].title, "subtracts");
        assert_eq!(annotations[1].message, "");
    }

    #[test]
    fn test_check_payload_failed_run() {
        let snapshot = ingest_bytes(FAILED_RUN.as_bytes(), None).unwrap();
        let payload = check_payload(
            &snapshot,
            Path::new("/work"),
            "abc123",
            false,
            "report body",
            completed_at(),
        );
        assert_eq!(payload.conclusion, "failure");
        assert_eq!(payload.completed_at, "2023-11-14T22:13:20Z");
        assert_eq!(payload.output.summary, "report body");
        assert_eq!(payload.output.text.as_deref(), Some("```\nexpected 2\n```"));
        assert_eq!(payload.output.annotations.len(), 2);
    }

    #[test]
    fn test_check_payload_successful_run_omits_annotations() {
        let snapshot = ingest_bytes(br#"{ "success": true }"#, None).unwrap();
        let payload = check_payload(
            &snapshot,
            Path::new("/work"),
            "abc123",
            true,
            "report body",
            completed_at(),
        );
        assert_eq!(payload.conclusion, "success");
        assert!(payload.output.text.is_none());
        assert!(payload.output.annotations.is_empty());

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["output"].get("text").is_none());
        assert_eq!(json["status"], "completed");
    }

    #[test]
    fn test_comment_payload_carries_marker() {
        let payload = comment_payload(7, "hello");
        assert_eq!(payload.issue_number, 7);
        assert!(payload.body.starts_with(COMMENT_MARKER));
        assert!(payload.body.ends_with("\nhello"));

        let json = serde_json::to_value(&payload).unwrap();
        assert!(json.get("issue_number").is_none());
    }

    #[test]
    fn test_comment_budget_leaves_room_for_marker() {
        let body = "x".repeat(comment_budget());
        assert_eq!(comment_payload(1, &body).body.chars().count(), COMMENT_BUDGET);
    }

    #[test]
    fn test_parse_pr_ref() {
        assert_eq!(parse_pr_ref("refs/pull/42/merge"), Some(42));
        assert_eq!(parse_pr_ref("refs/heads/main"), None);
    }
}
