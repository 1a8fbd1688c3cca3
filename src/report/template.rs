//! Document templates with `{{name}}` placeholders.
//!
//! All placeholders are substituted in one pass, so text inserted for one
//! field is never scanned for placeholders again.

use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{CovdeltaError, Result};

static PLACEHOLDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*([A-Za-z_.]+)\s*\}\}").unwrap());

const DEFAULT_TEMPLATE: &str = include_str!("../../template.md");

/// Values for every placeholder a template may use.
#[derive(Debug, Clone, Default)]
pub struct Fields {
    pub status: String,
    pub errors: String,
    pub suites: String,
    pub tests: String,
    pub snapshots: String,
    pub time: String,
    pub tests_review: String,
    pub summary_table: String,
    pub details_table: String,
}

impl Fields {
    /// Value of a placeholder by name, `None` for unknown names.
    pub fn get(&self, name: &str) -> Option<&str> {
        let value = match name {
            "status" => &self.status,
            "errors" => &self.errors,
            "summary.suites" => &self.suites,
            "summary.tests" => &self.tests,
            "summary.snapshots" => &self.snapshots,
            "summary.time" => &self.time,
            "tests.review" => &self.tests_review,
            "summary.table" => &self.summary_table,
            "details.table" => &self.details_table,
            _ => return None,
        };
        Some(value)
    }
}

#[derive(Debug, Clone)]
pub struct Template {
    text: String,
}

impl Default for Template {
    fn default() -> Self {
        Self::new(DEFAULT_TEMPLATE)
    }
}

impl Template {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            CovdeltaError::Template(format!("cannot read {}: {e}", path.display()))
        })?;
        Ok(Self::new(text))
    }

    /// Substitute every known placeholder. Unknown placeholders are left
    /// as written.
    pub fn fill(&self, fields: &Fields) -> String {
        PLACEHOLDER_RE
            .replace_all(&self.text, |caps: &Captures<'_>| match fields.get(&caps[1]) {
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}
