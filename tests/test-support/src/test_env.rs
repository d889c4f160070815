use anyhow::{Context, Result};
use assert_fs::prelude::*;
use assert_fs::TempDir;

use std::path::PathBuf;
use std::process::Command;

const BIN_NAME: &str = "sherpa-worktree";

/// Test environment with a real git repository and a scripted branch tool
///
/// The branch tool stand-in answers `--help`, appends its arguments to a log,
/// and checks out `feature/<lowercased issue>` in the repository.
pub struct CliTestEnvironment {
    pub repo_dir: assert_fs::fixture::ChildPath,
    pub branch_tool: assert_fs::fixture::ChildPath,
    pub branch_log: assert_fs::fixture::ChildPath,
    pub cd_file: assert_fs::fixture::ChildPath,
    pub config_home: assert_fs::fixture::ChildPath,
    _temp_dir: TempDir,
}

impl CliTestEnvironment {
    /// Creates a new test environment
    ///
    /// # Errors
    /// Returns an error if:
    /// - Failed to create temporary directory
    /// - Failed to initialize git repository
    /// - Failed to create initial commit
    /// - Failed to write the branch tool script
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        let repo_dir = temp_dir.child("test_repo");
        let branch_tool = temp_dir.child("fake-sherpa");
        let branch_log = temp_dir.child("fake-sherpa.log");
        let cd_file = temp_dir.child("cd-target");
        let config_home = temp_dir.child("config");

        repo_dir.create_dir_all()?;
        config_home.create_dir_all()?;
        cd_file.touch()?;

        Self::run_git_command(&repo_dir, &["init"])?;
        Self::run_git_command(&repo_dir, &["config", "user.name", "Test User"])?;
        Self::run_git_command(&repo_dir, &["config", "user.email", "test@example.com"])?;

        repo_dir.child("README.md").write_str("# Test Repo")?;
        Self::run_git_command(&repo_dir, &["add", "."])?;
        Self::run_git_command(&repo_dir, &["commit", "-m", "Initial commit"])?;

        // Some git versions default to 'master'
        Self::run_git_command(&repo_dir, &["branch", "-M", "main"])?;

        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--help\" ]; then exit 0; fi\n\
             printf '%s\\n' \"$*\" >> '{log}'\n\
             issue=$(printf '%s' \"$2\" | tr '[:upper:]' '[:lower:]')\n\
             exec git checkout -q -b \"feature/$issue\"\n",
            log = branch_log.path().display()
        );
        branch_tool.write_str(&script)?;
        make_executable(&branch_tool)?;

        Ok(Self {
            repo_dir,
            branch_tool,
            branch_log,
            cd_file,
            config_home,
            _temp_dir: temp_dir,
        })
    }

    /// Run a git command in the repository directory
    fn run_git_command(repo_path: &assert_fs::fixture::ChildPath, args: &[&str]) -> Result<()> {
        let output = Command::new("git")
            .args(args)
            .current_dir(repo_path.path())
            .output()
            .context("Failed to execute git command")?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("Git command failed: {}", stderr);
        }

        Ok(())
    }

    /// Runs git in the repository, for test setup
    ///
    /// # Errors
    /// Returns an error if git fails
    pub fn git(&self, args: &[&str]) -> Result<()> {
        Self::run_git_command(&self.repo_dir, args)
    }

    /// Execute the CLI from the repository root with the scripted branch tool
    ///
    /// # Errors
    /// Returns an error if the binary cannot be found
    pub fn run_command(&self, args: &[&str]) -> Result<assert_cmd::Command> {
        let tool = self.branch_tool.path().display().to_string();
        self.run_command_with_tool(args, &tool)
    }

    /// Execute the CLI with a specific branch command line
    ///
    /// # Errors
    /// Returns an error if the binary cannot be found
    pub fn run_command_with_tool(&self, args: &[&str], tool: &str) -> Result<assert_cmd::Command> {
        let mut cmd = assert_cmd::Command::cargo_bin(BIN_NAME)
            .with_context(|| format!("Failed to find {} binary", BIN_NAME))?;

        cmd.current_dir(self.repo_dir.path())
            .env("SHERPA_WORKTREE_BRANCH_COMMAND", tool)
            .env("SHERPA_WORKTREE_CD_FILE", self.cd_file.path())
            .env("HOME", self.config_home.path())
            .env("XDG_CONFIG_HOME", self.config_home.path())
            .env_remove("SHERPA_WORKTREE_DIR")
            .env_remove("SHERPA_WORKTREE_CONFIRM_WORD")
            .env_remove("RUST_LOG");

        cmd.args(args);
        Ok(cmd)
    }

    /// Adds a worktree on a new branch with plain git, bypassing the branch tool
    ///
    /// # Errors
    /// Returns an error if git fails
    pub fn add_worktree(&self, branch_name: &str) -> Result<PathBuf> {
        let path = self.worktree_path(branch_name)?;
        let path_str = path.display().to_string();
        self.git(&["worktree", "add", "-q", "-b", branch_name, &path_str])?;
        Ok(path)
    }

    /// Canonical repository root, as the CLI reports it
    ///
    /// # Errors
    /// Returns an error if the repository directory cannot be resolved
    pub fn repo_root(&self) -> Result<PathBuf> {
        Ok(self.repo_dir.path().canonicalize()?)
    }

    /// Where the CLI places the worktree for `branch_name`
    ///
    /// # Errors
    /// Returns an error if the repository directory cannot be resolved
    pub fn worktree_path(&self, branch_name: &str) -> Result<PathBuf> {
        let sanitized = branch_name.replace('/', "-");
        Ok(self.repo_root()?.join(".worktrees").join(sanitized))
    }

    /// Arguments the branch tool received, one invocation per line
    pub fn branch_log_contents(&self) -> String {
        std::fs::read_to_string(self.branch_log.path()).unwrap_or_default()
    }

    /// Directory the CLI asked the shell to change into, empty if none
    pub fn cd_file_contents(&self) -> String {
        std::fs::read_to_string(self.cd_file.path()).unwrap_or_default()
    }
}

#[cfg(unix)]
fn make_executable(path: &assert_fs::fixture::ChildPath) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    let mut permissions = std::fs::metadata(path.path())?.permissions();
    permissions.set_mode(0o755);
    std::fs::set_permissions(path.path(), permissions)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &assert_fs::fixture::ChildPath) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use predicates::prelude::*;

    #[test]
    fn test_cli_test_environment_creation() -> Result<()> {
        let env = CliTestEnvironment::new()?;

        env.repo_dir.assert(predicate::path::is_dir());
        env.repo_dir.child(".git").assert(predicate::path::exists());
        env.repo_dir
            .child("README.md")
            .assert(predicate::str::contains("# Test Repo"));
        env.branch_tool.assert(predicate::path::is_file());
        assert!(env.cd_file_contents().is_empty());

        Ok(())
    }

    #[test]
    fn test_worktree_path_sanitization() -> Result<()> {
        let env = CliTestEnvironment::new()?;

        let path = env.worktree_path("feature/test-branch")?;
        assert!(path.ends_with(".worktrees/feature-test-branch"));

        Ok(())
    }
}
