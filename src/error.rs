use std::path::PathBuf;

/// Failures the commands report to the operator.
///
/// Commands return `anyhow::Result` and raise these through `?`, so callers
/// that care about the kind (tests, mostly) can `downcast_ref` them.
#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    #[error("not inside a git working tree: {0}")]
    NotARepository(PathBuf),

    #[error("branch tool '{command}' is not available: {reason}")]
    BranchToolUnavailable { command: String, reason: String },

    #[error("branch tool failed for issue '{issue}' (exit code {code})")]
    BranchCreationFailed { issue: String, code: i32 },

    #[error("branch tool left no branch checked out after creating a branch for '{0}'")]
    NoBranchCheckedOut(String),

    #[error("failed to create worktree for branch '{branch}': {message}")]
    WorktreeCreationFailed { branch: String, message: String },

    #[error("worktree path already exists: {0}")]
    PathExists(PathBuf),

    #[error("worktree '{0}' not found")]
    NotFound(String),

    #[error("invalid selection '{input}': expected a number between 1 and {max}")]
    InvalidSelection { input: String, max: usize },

    #[error("failed to remove worktree {path}: {message}")]
    RemovalFailed { path: PathBuf, message: String },

    #[error("{failed} of {total} worktree(s) could not be removed")]
    BulkRemovalIncomplete { failed: usize, total: usize },

    #[error("empty branch command")]
    EmptyBranchCommand,
}
