use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::git::{HeadState, WorktreeRecord};

/// Trait for Git operations to enable mocking in tests
pub trait GitOperations {
    /// Root of the main working tree, even when opened from a linked worktree
    fn root(&self) -> PathBuf;
    fn list_worktrees(&self) -> Result<Vec<WorktreeRecord>>;
    fn head_state(&self) -> Result<HeadState>;
    fn restore_head(&self, state: &HeadState) -> Result<()>;
    fn default_branch(&self) -> Result<Option<String>>;
    fn list_local_branches(&self) -> Result<Vec<String>>;
    fn add_worktree(&self, branch_name: &str, worktree_path: &Path) -> Result<()>;
    fn remove_worktree(&self, worktree_path: &Path, force: bool) -> Result<()>;
    fn delete_branch(&self, branch_name: &str) -> Result<()>;
}

/// Arguments forwarded to the external branch-naming tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchRequest {
    pub issue: String,
    pub base: String,
    pub no_fetch: bool,
    pub prefer_hotfix: bool,
}

impl BranchRequest {
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "--issue".to_string(),
            self.issue.clone(),
            "--base".to_string(),
            self.base.clone(),
        ];
        if self.no_fetch {
            args.push("--no-fetch".to_string());
        }
        if self.prefer_hotfix {
            args.push("--prefer-hotfix".to_string());
        }
        args
    }
}

/// The external tool that names and checks out a branch for an issue
pub trait BranchTool {
    /// Probes the tool without side effects
    ///
    /// # Errors
    /// Returns an error if the tool cannot be found or does not respond
    fn ensure_available(&self) -> Result<()>;

    /// Runs the tool in `repo_root`; success means a branch is checked out there
    ///
    /// # Errors
    /// Returns an error if the tool cannot be spawned or exits non-zero
    fn create_branch(&self, request: &BranchRequest, repo_root: &Path) -> Result<()>;
}
