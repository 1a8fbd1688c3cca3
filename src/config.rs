//! Resolved run configuration, independent of how the values were supplied.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::report::columns::DisplayMode;
use crate::report::template::Template;

pub const DEFAULT_OUTPUT_FILE: &str = "jest.output.coverage.json";
pub const DEFAULT_JEST_FLAGS: &str = "--forceExit --testLocationInResults";
pub const DEFAULT_MIN_DELTA: f64 = -100.0;

/// Raw, optional settings as given on the command line or in the
/// environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigParams {
    pub workdir: Option<PathBuf>,
    pub command: Option<String>,
    pub jest_flags: Option<String>,
    pub jest_config: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub display_mode: DisplayMode,
    pub no_color: bool,
    pub min_delta: Option<f64>,
    pub template: Option<PathBuf>,
    pub base_branch: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absolute directory the tests run in.
    pub workdir: PathBuf,
    /// Shell command that produces the report at `output_file`.
    pub command: String,
    /// Absolute path of the Jest JSON report.
    pub output_file: PathBuf,
    pub display_mode: DisplayMode,
    pub colors: bool,
    /// Smallest allowed change in project statement coverage, in
    /// percentage points.
    pub min_delta: f64,
    /// Custom template; the built-in one is used when unset.
    pub template: Option<PathBuf>,
    /// Branch checked out for the baseline run.
    pub base_branch: Option<String>,
}

impl Config {
    pub fn resolve(params: ConfigParams) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let workdir = match params.workdir {
            Some(dir) => cwd.join(dir),
            None => cwd,
        };

        let output_file = workdir.join(
            params
                .output_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_FILE)),
        );

        let command = params.command.filter(|c| !c.trim().is_empty()).unwrap_or_else(|| {
            default_command(
                params.jest_flags.as_deref().unwrap_or(DEFAULT_JEST_FLAGS),
                &output_file,
                params.jest_config.map(|c| workdir.join(c)).as_deref(),
            )
        });

        Ok(Self {
            workdir,
            command,
            output_file,
            display_mode: params.display_mode,
            colors: !params.no_color,
            min_delta: params.min_delta.unwrap_or(DEFAULT_MIN_DELTA),
            template: params.template,
            base_branch: params.base_branch.filter(|b| !b.trim().is_empty()),
        })
    }

    pub fn load_template(&self) -> Result<Template> {
        match &self.template {
            Some(path) => Template::from_path(path),
            None => Ok(Template::default()),
        }
    }
}

/// `npx jest` invocation writing a JSON report with coverage.
fn default_command(flags: &str, output_file: &Path, jest_config: Option<&Path>) -> String {
    let mut command = format!(
        "npx jest {flags} --coverage --json --outputFile={}",
        output_file.display()
    );
    if let Some(config) = jest_config {
        command.push_str(&format!(" --config {}", config.display()));
    }
    command
}
