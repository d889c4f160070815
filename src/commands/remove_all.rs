use anyhow::Result;
use console::style;
use std::path::PathBuf;

use crate::commands::Workspace;
use crate::commands::remove::{RemovalOutcome, remove_with_fallback};
use crate::config::Settings;
use crate::error::WorktreeError;
use crate::location::Location;
use crate::selection::{RealSelectionProvider, SelectionProvider, confirm_word};
use crate::storage::WorktreeStorage;
use crate::traits::GitOperations;

/// Result of a bulk removal
#[derive(Debug, Default, PartialEq, Eq)]
pub struct BulkRemoval {
    pub removed: usize,
    pub forced: usize,
    pub failed: Vec<(PathBuf, String)>,
}

/// Removes every registered worktree after the confirmation word is typed
///
/// # Errors
/// Returns an error if:
/// - The location is not inside a git working tree
/// - Any worktree could not be removed (the others are still removed)
pub fn remove_all_worktrees(location: &mut Location) -> Result<()> {
    let workspace = Workspace::open(location)?;
    remove_all_worktrees_with_provider(
        &workspace.git,
        &workspace.settings,
        &RealSelectionProvider,
        location,
    )
}

/// Bulk removal with injected git and selection providers (for testing)
///
/// # Errors
/// Returns an error if any worktree could not be removed
pub fn remove_all_worktrees_with_provider(
    git_repo: &dyn GitOperations,
    settings: &Settings,
    provider: &dyn SelectionProvider,
    location: &mut Location,
) -> Result<()> {
    let worktrees = git_repo.list_worktrees()?;
    if worktrees.is_empty() {
        println!("No worktrees found.");
        return Ok(());
    }

    println!("The following worktrees will be removed:");
    for worktree in &worktrees {
        println!(
            "  {} ({})",
            worktree.branch_label(),
            worktree.path.display()
        );
    }
    println!();

    let prompt = format!(
        "{} This removes {} worktree(s), including uncommitted changes.",
        style("⚠").yellow(),
        worktrees.len()
    );
    if !confirm_word(provider, &prompt, &settings.confirm_word)? {
        println!("Cancelled.");
        return Ok(());
    }

    let repo_root = git_repo.root();
    let storage = WorktreeStorage::new(&repo_root, settings);

    *location = location.clone().leave(storage.get_root_dir(), &repo_root);
    for worktree in &worktrees {
        *location = location.clone().leave(&worktree.path, &repo_root);
    }

    let mut summary = BulkRemoval::default();
    for worktree in &worktrees {
        match remove_with_fallback(git_repo, &storage, &worktree.path) {
            RemovalOutcome::Removed => {
                println!("  {} {}", style("✓").green(), worktree.path.display());
                summary.removed += 1;
            }
            RemovalOutcome::ForceRemoved { .. } => {
                println!(
                    "  {} {} (forced)",
                    style("✓").green(),
                    worktree.path.display()
                );
                summary.removed += 1;
                summary.forced += 1;
            }
            RemovalOutcome::Failed { refusal, forced } => {
                println!("  {} {}", style("✗").red(), worktree.path.display());
                summary
                    .failed
                    .push((worktree.path.clone(), format!("{}; {}", refusal, forced)));
            }
        }
    }

    if storage.remove_root_dir_if_empty() {
        println!(
            "Removed empty directory: {}",
            storage.get_root_dir().display()
        );
    }

    if summary.forced > 0 {
        println!(
            "\n{} Removed {} worktree(s), {} with --force",
            style("✓").green(),
            summary.removed,
            summary.forced
        );
    } else {
        println!(
            "\n{} Removed {} worktree(s)",
            style("✓").green(),
            summary.removed
        );
    }

    if summary.failed.is_empty() {
        return Ok(());
    }

    println!("{} Could not remove:", style("✗").red());
    for (path, message) in &summary.failed {
        println!("  {}: {}", path.display(), message);
    }
    Err(WorktreeError::BulkRemovalIncomplete {
        failed: summary.failed.len(),
        total: worktrees.len(),
    }
    .into())
}
