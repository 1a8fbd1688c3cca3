use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};

use covdelta::cli::{self, RunOptions};
use covdelta::config::{Config, ConfigParams};
use covdelta::report::columns::DisplayMode;

/// covdelta: Jest coverage reports with deltas against the base branch.
#[derive(Parser)]
#[command(name = "covdelta", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every command that renders a report.
#[derive(Args)]
struct RenderArgs {
    /// Directory the tests run in (default: current directory).
    #[arg(long, env = "COVDELTA_WORKDIR")]
    workdir: Option<PathBuf>,

    /// Columns shown in the coverage tables.
    #[arg(long, value_enum, default_value_t = DisplayMode::All)]
    display_mode: DisplayMode,

    /// Disable color emphasis in the rendered markdown.
    #[arg(long)]
    no_color: bool,

    /// Smallest allowed change in statement coverage, in percentage points.
    #[arg(long, env = "COVDELTA_MIN_DELTA", allow_negative_numbers = true)]
    min_delta: Option<f64>,

    /// Markdown template replacing the built-in one.
    #[arg(long)]
    template: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tests on this checkout and the base branch, then report.
    Run {
        #[command(flatten)]
        render: RenderArgs,

        /// Test command producing the Jest JSON report.
        #[arg(long, env = "COVDELTA_COMMAND")]
        command: Option<String>,

        /// Extra flags for the default `npx jest` command.
        #[arg(long, env = "COVDELTA_JEST_FLAGS", allow_hyphen_values = true)]
        jest_flags: Option<String>,

        /// Jest config file, relative to the working directory.
        #[arg(long, env = "COVDELTA_JEST_CONFIG")]
        jest_config: Option<PathBuf>,

        /// Where the test command writes its report.
        #[arg(long, env = "COVDELTA_OUTPUT_FILE")]
        output_file: Option<PathBuf>,

        /// Branch to compare against.
        #[arg(long, env = "GITHUB_BASE_REF")]
        base_branch: Option<String>,

        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        github_token: Option<String>,

        /// Do not call the GitHub API.
        #[arg(long)]
        dry_run: bool,

        /// Write report.md and comment.md into this directory.
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },

    /// Render an existing report file.
    Render {
        /// Path to the Jest JSON report.
        report: PathBuf,

        /// Jest JSON report of the baseline run.
        #[arg(long)]
        baseline: Option<PathBuf>,

        /// Print the size-capped comment instead of the full report.
        #[arg(long)]
        comment: bool,

        #[command(flatten)]
        render: RenderArgs,
    },

    /// Show project totals of a report file.
    Summary {
        /// Path to the Jest JSON report.
        report: PathBuf,
    },
}

impl RenderArgs {
    fn into_params(self) -> ConfigParams {
        ConfigParams {
            workdir: self.workdir,
            display_mode: self.display_mode,
            no_color: self.no_color,
            min_delta: self.min_delta,
            template: self.template,
            ..Default::default()
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            render,
            command,
            jest_flags,
            jest_config,
            output_file,
            base_branch,
            github_token,
            dry_run,
            out_dir,
        } => {
            let config = Config::resolve(ConfigParams {
                command,
                jest_flags,
                jest_config,
                output_file,
                base_branch,
                ..render.into_params()
            })?;
            let options = RunOptions {
                dry_run,
                github_token,
                out_dir,
            };
            let verdict = cli::cmd_run(&config, &options)?;
            if !verdict.passed {
                bail!("{}", verdict.errors.join("; "));
            }
        }
        Commands::Render {
            report,
            baseline,
            comment,
            render,
        } => {
            let config = Config::resolve(render.into_params())?;
            print!(
                "{}",
                cli::cmd_render(&config, &report, baseline.as_deref(), comment)?
            );
        }
        Commands::Summary { report } => print!("{}", cli::cmd_summary(&report)?),
    }
    Ok(())
}
