use anyhow::Result;
use console::style;
use std::fmt::Write;
use std::path::Path;

use crate::commands::Workspace;
use crate::git::WorktreeRecord;
use crate::location::Location;
use crate::traits::GitOperations;

/// Prints every linked worktree of the repository at `location`
///
/// # Errors
/// Returns an error if:
/// - The location is not inside a git working tree
/// - `git worktree list` fails
pub fn list_worktrees(location: &Location) -> Result<()> {
    let workspace = Workspace::open(location)?;
    list_worktrees_with_git(&workspace.git)
}

/// Test version that accepts a mock git repository
///
/// # Errors
/// Returns an error if the worktree registry cannot be read
pub fn list_worktrees_with_git(git_repo: &dyn GitOperations) -> Result<()> {
    let worktrees = git_repo.list_worktrees()?;
    print!("{}", render_listing(&git_repo.root(), &worktrees));
    Ok(())
}

#[must_use]
pub fn render_listing(repo_root: &Path, worktrees: &[WorktreeRecord]) -> String {
    let mut out = String::new();
    writeln!(out, "Worktrees for repository: {}", repo_root.display()).ok();
    writeln!(out, "{}", "=".repeat(40)).ok();

    if worktrees.is_empty() {
        writeln!(out, "No worktrees found.").ok();
        return out;
    }

    for worktree in worktrees {
        let status = if worktree.path.exists() {
            style("✓").green()
        } else {
            style("✗").red()
        };
        writeln!(
            out,
            "  {} {} ({})",
            status,
            worktree.branch_label(),
            worktree.path.display()
        )
        .ok();
    }

    out
}
