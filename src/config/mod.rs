//! Layered settings for sherpa-worktree.
//!
//! Values are resolved in this order, later layers winning:
//! 1. Built-in defaults
//! 2. User file: `<config dir>/sherpa-worktree/config.toml`
//! 3. Repository file: `<repo root>/.sherpa-worktree.toml`
//! 4. Environment: `SHERPA_WORKTREE_DIR`, `SHERPA_WORKTREE_BRANCH_COMMAND`,
//!    `SHERPA_WORKTREE_CONFIRM_WORD`
//!
//! Every key is optional in the files, so a partial file only overrides
//! what it names.
//!
//! ```toml
//! worktrees-dir = ".worktrees"
//! branch-command = "gh sherpa create-branch"
//! confirm-word = "si"
//! default-base = "main"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const REPO_CONFIG_FILE: &str = ".sherpa-worktree.toml";

pub const ENV_WORKTREES_DIR: &str = "SHERPA_WORKTREE_DIR";
pub const ENV_BRANCH_COMMAND: &str = "SHERPA_WORKTREE_BRANCH_COMMAND";
pub const ENV_CONFIRM_WORD: &str = "SHERPA_WORKTREE_CONFIRM_WORD";

/// Resolved settings for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Container directory for worktrees, relative to the main working tree
    pub worktrees_dir: PathBuf,
    /// External branch tool command line, split on whitespace
    pub branch_command: String,
    /// Literal token `--clean-all` requires before removing anything
    pub confirm_word: String,
    /// Base branch when the remote has no symbolic default
    pub default_base: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            worktrees_dir: PathBuf::from(".worktrees"),
            branch_command: "gh sherpa create-branch".to_string(),
            confirm_word: "si".to_string(),
            default_base: "main".to_string(),
        }
    }
}

/// One settings file; any key may be omitted
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SettingsFile {
    #[serde(default)]
    pub worktrees_dir: Option<PathBuf>,
    #[serde(default)]
    pub branch_command: Option<String>,
    #[serde(default)]
    pub confirm_word: Option<String>,
    #[serde(default)]
    pub default_base: Option<String>,
}

impl SettingsFile {
    /// Reads a settings file, treating a missing, blank or invalid file as empty
    ///
    /// # Errors
    /// Only returns an error if the file exists but cannot be read.
    /// TOML parse errors are reported as warnings.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        match toml::from_str::<SettingsFile>(&content) {
            Ok(file) => Ok(file),
            Err(e) => {
                tracing::warn!("Invalid TOML in {}, ignoring it: {}", path.display(), e);
                Ok(Self::default())
            }
        }
    }
}

impl Settings {
    /// Loads settings for the repository rooted at `repo_root`
    ///
    /// # Errors
    /// Returns an error if a settings file exists but cannot be read
    pub fn load(repo_root: &Path) -> Result<Self> {
        let mut settings = Self::default();

        if let Some(user_file) = user_config_path() {
            settings.apply(SettingsFile::load(&user_file)?);
        }
        settings.apply(SettingsFile::load(&repo_root.join(REPO_CONFIG_FILE))?);
        settings.apply_env(|key| std::env::var(key).ok());

        tracing::debug!(?settings, "settings loaded");
        Ok(settings)
    }

    /// Overlays the keys present in `file`
    pub fn apply(&mut self, file: SettingsFile) {
        if let Some(dir) = file.worktrees_dir {
            self.worktrees_dir = dir;
        }
        if let Some(command) = file.branch_command {
            self.branch_command = command;
        }
        if let Some(word) = file.confirm_word {
            self.confirm_word = word;
        }
        if let Some(base) = file.default_base {
            self.default_base = base;
        }
    }

    /// Overlays environment variables; empty values are ignored
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = lookup(ENV_WORKTREES_DIR) {
            self.worktrees_dir = PathBuf::from(dir);
        }
        if let Some(command) = lookup(ENV_BRANCH_COMMAND) {
            self.branch_command = command;
        }
        if let Some(word) = lookup(ENV_CONFIRM_WORD) {
            self.confirm_word = word;
        }
    }
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("sherpa-worktree").join("config.toml"))
}
