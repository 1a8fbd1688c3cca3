//! Thin wrappers around the external test command and git.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use log::{debug, info, warn};

use crate::config::Config;

/// Run the configured test command in the working directory.
///
/// Any report left by an earlier run is removed first, and the command must
/// write a new one. A non-zero exit status is expected when tests fail; the
/// outcome is read from the report file instead, so it is only logged here.
pub fn run_tests(config: &Config) -> Result<()> {
    remove_report(&config.output_file)?;

    info!("Running `{}` in {}", config.command, config.workdir.display());
    let status = Command::new("sh")
        .arg("-c")
        .arg(&config.command)
        .current_dir(&config.workdir)
        .status()
        .with_context(|| format!("Failed to run `{}`", config.command))?;

    if !status.success() {
        warn!("Test command exited with {status}");
    }
    if !config.output_file.is_file() {
        bail!(
            "Test command did not write a report to {}",
            config.output_file.display()
        );
    }
    Ok(())
}

fn remove_report(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale report {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("Failed to remove {}", path.display())),
    }
}

/// Git operations used to produce the baseline run.
pub struct Git {
    workdir: PathBuf,
}

impl Git {
    pub fn new(workdir: &Path) -> Self {
        Self {
            workdir: workdir.to_path_buf(),
        }
    }

    /// Fetch all remotes shallowly and force-checkout `branch`.
    pub fn checkout_branch(&self, branch: &str) -> Result<()> {
        self.git(&["fetch", "--all", "--depth=1"])?;
        self.git(&["checkout", "-f", branch])
    }

    /// Return to the previously checked-out ref.
    pub fn checkout_previous(&self) -> Result<()> {
        self.git(&["checkout", "-"])
    }

    fn git(&self, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .output()
            .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("git {} failed: {stderr}", args.join(" "));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigParams;

    fn config(dir: &Path, command: &str) -> Config {
        Config::resolve(ConfigParams {
            workdir: Some(dir.to_path_buf()),
            command: Some(command.to_string()),
            output_file: Some(PathBuf::from("out.json")),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_run_tests_requires_fresh_report() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("out.json"), "stale").unwrap();

        let err = run_tests(&config(dir.path(), "exit 1")).unwrap_err();
        assert!(err.to_string().contains("did not write a report"));
        assert!(!dir.path().join("out.json").exists());
    }

    #[test]
    fn test_run_tests_failing_command_with_report() {
        let dir = tempfile::tempdir().unwrap();

        run_tests(&config(dir.path(), "echo '{}' > out.json; exit 1")).unwrap();
        assert!(dir.path().join("out.json").is_file());
    }
}
