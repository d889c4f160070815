use anyhow::{Context, Result};
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::WorktreeError;
use crate::traits::{BranchRequest, BranchTool};

/// The external branch-naming command, `gh sherpa create-branch` by default
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SherpaCommand {
    program: String,
    args: Vec<String>,
}

impl SherpaCommand {
    /// Splits a command line such as `gh sherpa create-branch` on whitespace
    ///
    /// # Errors
    /// Returns an error if the command line is blank
    pub fn parse(command_line: &str) -> Result<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next().ok_or(WorktreeError::EmptyBranchCommand)?;
        Ok(Self {
            program,
            args: parts.collect(),
        })
    }

    #[must_use]
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn unavailable(&self, reason: impl Into<String>) -> WorktreeError {
        WorktreeError::BranchToolUnavailable {
            command: self.display(),
            reason: reason.into(),
        }
    }
}

impl BranchTool for SherpaCommand {
    fn ensure_available(&self) -> Result<()> {
        let resolved = which::which(&self.program)
            .map_err(|e| self.unavailable(format!("{} not found: {}", self.program, e)))?;
        tracing::debug!(program = %resolved.display(), "branch tool resolved");

        // `gh` alone is not enough; the sherpa extension must answer too
        let status = Command::new(&resolved)
            .args(&self.args)
            .arg("--help")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|e| self.unavailable(e.to_string()))?;

        if !status.success() {
            return Err(self
                .unavailable(format!(
                    "`{} --help` exited with {}",
                    self.display(),
                    status.code().unwrap_or(-1)
                ))
                .into());
        }
        Ok(())
    }

    fn create_branch(&self, request: &BranchRequest, repo_root: &Path) -> Result<()> {
        let forwarded = request.to_args();
        tracing::info!(
            command = %self.display(),
            args = %forwarded.join(" "),
            "running branch tool"
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .args(&forwarded)
            .current_dir(repo_root)
            .status()
            .with_context(|| format!("Failed to run {}", self.display()))?;

        if !status.success() {
            return Err(WorktreeError::BranchCreationFailed {
                issue: request.issue.clone(),
                code: status.code().unwrap_or(-1),
            }
            .into());
        }
        Ok(())
    }
}
