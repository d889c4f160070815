use anyhow::{Context, Result};
use console::style;
use std::path::{Path, PathBuf};

use crate::commands::Workspace;
use crate::config::Settings;
use crate::error::WorktreeError;
use crate::git::HeadState;
use crate::location::Location;
use crate::sherpa::SherpaCommand;
use crate::storage::WorktreeStorage;
use crate::traits::{BranchRequest, BranchTool, GitOperations};

/// Flags that shape one creation run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateOptions {
    pub issue: String,
    pub base: Option<String>,
    pub no_fetch: bool,
    pub prefer_hotfix: bool,
    pub no_cd: bool,
}

/// Creates a branch for an issue with the branch tool, then a worktree for it
///
/// # Errors
/// Returns an error if:
/// - The location is not inside a git working tree
/// - The branch tool is missing or fails
/// - The worktree cannot be created
pub fn create_worktree(options: &CreateOptions, location: &mut Location) -> Result<()> {
    let workspace = Workspace::open(location)?;
    let tool = SherpaCommand::parse(&workspace.settings.branch_command)?;
    create_worktree_with_git(&workspace.git, &tool, &workspace.settings, options, location)?;
    Ok(())
}

/// Test version that accepts a mock git repository and branch tool
///
/// Returns the path of the new worktree.
///
/// # Errors
/// Returns an error if:
/// - The branch tool is missing or fails
/// - The branch tool leaves no branch checked out
/// - The worktree cannot be created
pub fn create_worktree_with_git(
    git_repo: &dyn GitOperations,
    tool: &dyn BranchTool,
    settings: &Settings,
    options: &CreateOptions,
    location: &mut Location,
) -> Result<PathBuf> {
    // Probe before touching anything
    tool.ensure_available()?;

    let repo_root = git_repo.root();
    let storage = WorktreeStorage::new(&repo_root, settings);

    let base = match &options.base {
        Some(base) => base.clone(),
        None => resolve_default_base(git_repo, settings)?,
    };

    let previous_head = git_repo.head_state()?;
    let branches_before = git_repo.list_local_branches()?;

    let request = BranchRequest {
        issue: options.issue.clone(),
        base: base.clone(),
        no_fetch: options.no_fetch,
        prefer_hotfix: options.prefer_hotfix,
    };
    println!(
        "Creating branch for issue '{}' from '{}'...",
        options.issue, base
    );
    tool.create_branch(&request, &repo_root)?;

    let branch = match git_repo.head_state()? {
        HeadState::Branch(name) => name,
        HeadState::Detached(_) => {
            return Err(WorktreeError::NoBranchCheckedOut(options.issue.clone()).into());
        }
    };
    println!("{} Branch ready: {}", style("✓").green(), branch);

    if previous_head.branch() == Some(branch.as_str()) {
        return Err(WorktreeError::WorktreeCreationFailed {
            branch,
            message: "it is already checked out in the main working tree".to_string(),
        }
        .into());
    }

    let created_now = !branches_before.contains(&branch);
    let worktree_path = storage.get_worktree_path(&branch);

    if let Err(e) = bind_worktree(git_repo, &storage, &previous_head, &branch, &worktree_path) {
        if created_now {
            compensate(git_repo, &branch);
        }
        return Err(WorktreeError::WorktreeCreationFailed {
            branch,
            message: format!("{:#}", e),
        }
        .into());
    }

    println!("{} Worktree created successfully!", style("✓").green());
    println!("  Branch: {}", branch);
    println!("  Path: {}", worktree_path.display());

    if !options.no_cd {
        *location = Location::new(&worktree_path);
        println!("→ Now in: {}", location.path().display());
    }

    Ok(worktree_path)
}

fn resolve_default_base(git_repo: &dyn GitOperations, settings: &Settings) -> Result<String> {
    if let Some(branch) = git_repo.default_branch()? {
        tracing::debug!(base = %branch, "using remote default branch");
        return Ok(branch);
    }
    tracing::warn!(
        "origin/HEAD is not set; using '{}' as base branch",
        settings.default_base
    );
    Ok(settings.default_base.clone())
}

/// Hands the new branch from the main working tree to a fresh worktree
fn bind_worktree(
    git_repo: &dyn GitOperations,
    storage: &WorktreeStorage,
    previous_head: &HeadState,
    branch: &str,
    worktree_path: &Path,
) -> Result<()> {
    // A branch can only be checked out once across worktrees
    println!("Switching main working tree back to {}", previous_head);
    git_repo
        .restore_head(previous_head)
        .with_context(|| format!("Failed to switch back to {}", previous_head))?;

    if worktree_path.exists() {
        return Err(WorktreeError::PathExists(worktree_path.to_path_buf()).into());
    }

    storage.ensure_root_dir()?;
    println!(
        "Creating worktree for branch '{}' at: {}",
        branch,
        worktree_path.display()
    );
    git_repo.add_worktree(branch, worktree_path)
}

/// Deletes a branch this run caused to exist, so a failed run leaves no trace
fn compensate(git_repo: &dyn GitOperations, branch: &str) {
    match git_repo.delete_branch(branch) {
        Ok(()) => println!(
            "{} Deleted branch '{}' created for this run",
            style("⚠").yellow(),
            branch
        ),
        Err(e) => println!(
            "{} Warning: branch '{}' was left in place: {:#}",
            style("⚠").yellow(),
            branch,
            e
        ),
    }
}
