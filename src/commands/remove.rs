use anyhow::Result;
use console::style;
use std::path::Path;

use crate::commands::Workspace;
use crate::config::Settings;
use crate::error::WorktreeError;
use crate::git::WorktreeRecord;
use crate::location::{Location, normalize};
use crate::selection::{RealSelectionProvider, SelectionProvider, confirm, select_index};
use crate::storage::WorktreeStorage;
use crate::traits::GitOperations;

/// How a worktree removal went
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// `git worktree remove` succeeded
    Removed,
    /// Plain removal was refused; `--force` succeeded
    ForceRemoved { refusal: String },
    /// Both attempts were refused
    Failed { refusal: String, forced: String },
}

impl RemovalOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        !matches!(self, RemovalOutcome::Failed { .. })
    }
}

/// Removes one worktree: plain removal, then `--force`, then leftover cleanup
pub fn remove_with_fallback(
    git_repo: &dyn GitOperations,
    storage: &WorktreeStorage,
    worktree_path: &Path,
) -> RemovalOutcome {
    let outcome = match git_repo.remove_worktree(worktree_path, false) {
        Ok(()) => RemovalOutcome::Removed,
        Err(refusal) => {
            tracing::info!(path = %worktree_path.display(), "plain removal refused, forcing");
            match git_repo.remove_worktree(worktree_path, true) {
                Ok(()) => RemovalOutcome::ForceRemoved {
                    refusal: format!("{:#}", refusal),
                },
                Err(forced) => RemovalOutcome::Failed {
                    refusal: format!("{:#}", refusal),
                    forced: format!("{:#}", forced),
                },
            }
        }
    };

    if outcome.is_success() {
        if let Err(e) = storage.remove_leftovers(worktree_path) {
            println!("{} Warning: {:#}", style("⚠").yellow(), e);
        }
    }

    outcome
}

/// Removes a worktree by name or path, or from a numbered menu when no
/// target is given
///
/// # Errors
/// Returns an error if:
/// - The location is not inside a git working tree
/// - The target is not a registered worktree
/// - The menu selection is invalid
/// - Git refuses the removal even when forced
pub fn remove_worktree(target: Option<&str>, location: &mut Location) -> Result<()> {
    let workspace = Workspace::open(location)?;
    remove_worktree_with_provider(
        &workspace.git,
        &workspace.settings,
        &RealSelectionProvider,
        target,
        location,
    )
}

/// Removes a worktree with injected git and selection providers (for testing)
///
/// # Errors
/// Returns an error if:
/// - The target is not a registered worktree
/// - The menu selection is invalid
/// - Git refuses the removal even when forced
pub fn remove_worktree_with_provider(
    git_repo: &dyn GitOperations,
    settings: &Settings,
    provider: &dyn SelectionProvider,
    target: Option<&str>,
    location: &mut Location,
) -> Result<()> {
    let worktrees = git_repo.list_worktrees()?;

    let selected = match target {
        Some(target) => find_target(&worktrees, target, location)
            .ok_or_else(|| WorktreeError::NotFound(target.to_string()))?,
        None => {
            if worktrees.is_empty() {
                println!("No worktrees found.");
                return Ok(());
            }
            let labels: Vec<String> = worktrees
                .iter()
                .map(|w| format!("{} ({})", w.branch_label(), w.path.display()))
                .collect();
            println!("Worktrees:");
            match select_index(provider, "Select worktree to remove (Enter to cancel):", &labels)? {
                Some(index) => &worktrees[index],
                None => {
                    println!("Cancelled.");
                    return Ok(());
                }
            }
        }
    };

    let question = format!(
        "Remove worktree '{}' ({})?",
        selected.name(),
        selected.branch_label()
    );
    if !confirm(provider, &question)? {
        println!("Cancelled.");
        return Ok(());
    }

    let repo_root = git_repo.root();
    let storage = WorktreeStorage::new(&repo_root, settings);

    *location = location.clone().leave(&selected.path, &repo_root);

    println!("Removing worktree: {}", selected.path.display());
    let outcome = remove_with_fallback(git_repo, &storage, &selected.path);

    // Leftover cleanup may have taken an emptied parent with it
    if !location.path().exists() {
        *location = Location::new(&repo_root);
    }

    match outcome {
        RemovalOutcome::Removed => {}
        RemovalOutcome::ForceRemoved { refusal } => {
            println!(
                "{} Plain removal was refused, removed with --force: {}",
                style("⚠").yellow(),
                refusal
            );
        }
        RemovalOutcome::Failed { refusal, forced } => {
            return Err(WorktreeError::RemovalFailed {
                path: selected.path.clone(),
                message: format!("{}; forced removal: {}", refusal, forced),
            }
            .into());
        }
    }

    println!("{} Worktree removed successfully!", style("✓").green());
    Ok(())
}

/// Finds a worktree whose directory name or path equals `target`
#[must_use]
pub fn find_target<'a>(
    worktrees: &'a [WorktreeRecord],
    target: &str,
    location: &Location,
) -> Option<&'a WorktreeRecord> {
    let target_path = location.resolve(target);
    worktrees
        .iter()
        .find(|w| w.name() == target || normalize(&w.path) == target_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::MockSelectionProvider;
    use crate::traits::mock::MockGit;
    use std::path::PathBuf;

    struct Fixture {
        _dir: tempfile::TempDir,
        root: PathBuf,
    }

    impl Fixture {
        fn new() -> Result<Self> {
            let dir = tempfile::tempdir()?;
            let root = dir.path().canonicalize()?;
            Ok(Self { _dir: dir, root })
        }

        fn worktree(&self, name: &str) -> PathBuf {
            self.root.join(".worktrees").join(name)
        }
    }

    fn remove(
        git: &MockGit,
        input: &[&str],
        target: Option<&str>,
        location: &mut Location,
    ) -> Result<()> {
        let provider = MockSelectionProvider::new(input.iter().copied());
        remove_worktree_with_provider(git, &Settings::default(), &provider, target, location)
    }

    #[test]
    fn test_targeted_removal_by_name() -> Result<()> {
        let fx = Fixture::new()?;
        let path = fx.worktree("feature-a");
        let git = MockGit::new(&fx.root).with_worktree(&path, "feature/a");
        let mut location = Location::new(&fx.root);

        remove(&git, &["s"], Some("feature-a"), &mut location)?;

        assert!(git.worktrees.borrow().is_empty());
        assert!(!path.exists());
        assert_eq!(location.path(), fx.root);
        Ok(())
    }

    #[test]
    fn test_targeted_removal_by_relative_path() -> Result<()> {
        let fx = Fixture::new()?;
        let path = fx.worktree("feature-a");
        let git = MockGit::new(&fx.root).with_worktree(&path, "feature/a");
        let mut location = Location::new(&fx.root);

        remove(&git, &["y"], Some(".worktrees/feature-a"), &mut location)?;

        assert!(git.worktrees.borrow().is_empty());
        Ok(())
    }

    #[test]
    fn test_targeted_removal_not_found_touches_nothing() -> Result<()> {
        let fx = Fixture::new()?;
        let path = fx.worktree("feature-a");
        let git = MockGit::new(&fx.root).with_worktree(&path, "feature/a");
        let mut location = Location::new(&fx.root);

        let result = remove(&git, &["s"], Some("feature-b"), &mut location);

        assert!(matches!(
            result.as_ref().map_err(|e| e.downcast_ref::<WorktreeError>()),
            Err(Some(WorktreeError::NotFound(name))) if name == "feature-b"
        ));
        assert!(git.calls().is_empty());
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn test_branch_name_is_not_a_target() -> Result<()> {
        let fx = Fixture::new()?;
        let git = MockGit::new(&fx.root).with_worktree(&fx.worktree("feature-a"), "feature/a");
        let mut location = Location::new(&fx.root);

        assert!(remove(&git, &["s"], Some("feature/a"), &mut location).is_err());
        Ok(())
    }

    #[test]
    fn test_declined_confirmation_cancels() -> Result<()> {
        let fx = Fixture::new()?;
        let path = fx.worktree("feature-a");
        let git = MockGit::new(&fx.root).with_worktree(&path, "feature/a");
        let mut location = Location::new(&fx.root);

        remove(&git, &["n"], Some("feature-a"), &mut location)?;

        assert!(git.calls().is_empty());
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn test_relocates_out_of_removed_worktree() -> Result<()> {
        let fx = Fixture::new()?;
        let path = fx.worktree("feature-a");
        let git = MockGit::new(&fx.root).with_worktree(&path, "feature/a");
        std::fs::create_dir_all(path.join("src"))?;
        let mut location = Location::new(&path.join("src"));

        remove(&git, &["s"], Some("feature-a"), &mut location)?;

        assert_eq!(location, Location::new(&fx.root));
        Ok(())
    }

    #[test]
    fn test_interactive_selection() -> Result<()> {
        let fx = Fixture::new()?;
        let git = MockGit::new(&fx.root)
            .with_worktree(&fx.worktree("feature-a"), "feature/a")
            .with_worktree(&fx.worktree("feature-b"), "feature/b");
        let mut location = Location::new(&fx.root);

        remove(&git, &["2", "s"], None, &mut location)?;

        let remaining = git.worktrees.borrow();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].branch.as_deref(), Some("feature/a"));
        Ok(())
    }

    #[test]
    fn test_interactive_empty_input_cancels() -> Result<()> {
        let fx = Fixture::new()?;
        let git = MockGit::new(&fx.root).with_worktree(&fx.worktree("feature-a"), "feature/a");
        let mut location = Location::new(&fx.root);

        remove(&git, &[""], None, &mut location)?;

        assert_eq!(git.worktrees.borrow().len(), 1);
        assert!(git.calls().is_empty());
        Ok(())
    }

    #[test]
    fn test_interactive_out_of_range_is_invalid() -> Result<()> {
        let fx = Fixture::new()?;
        let git = MockGit::new(&fx.root).with_worktree(&fx.worktree("feature-a"), "feature/a");
        let mut location = Location::new(&fx.root);

        let result = remove(&git, &["5"], None, &mut location);

        assert!(matches!(
            result.as_ref().map_err(|e| e.downcast_ref::<WorktreeError>()),
            Err(Some(WorktreeError::InvalidSelection { .. }))
        ));
        assert_eq!(git.worktrees.borrow().len(), 1);
        Ok(())
    }

    #[test]
    fn test_dirty_worktree_is_force_removed() -> Result<()> {
        let fx = Fixture::new()?;
        let path = fx.worktree("feature-a");
        let mut git = MockGit::new(&fx.root).with_worktree(&path, "feature/a");
        git.dirty.push(path.clone());
        let storage = WorktreeStorage::new(&fx.root, &Settings::default());

        let outcome = remove_with_fallback(&git, &storage, &path);

        assert!(matches!(outcome, RemovalOutcome::ForceRemoved { .. }));
        assert_eq!(
            git.calls(),
            vec![
                format!("remove {}", path.display()),
                format!("remove --force {}", path.display()),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_locked_worktree_fails() -> Result<()> {
        let fx = Fixture::new()?;
        let path = fx.worktree("feature-a");
        let mut git = MockGit::new(&fx.root).with_worktree(&path, "feature/a");
        git.locked.push(path.clone());
        let mut location = Location::new(&fx.root);

        let result = remove_worktree_with_provider(
            &git,
            &Settings::default(),
            &MockSelectionProvider::new(["s"]),
            Some("feature-a"),
            &mut location,
        );

        assert!(matches!(
            result.as_ref().map_err(|e| e.downcast_ref::<WorktreeError>()),
            Err(Some(WorktreeError::RemovalFailed { .. }))
        ));
        assert!(path.exists());
        Ok(())
    }
}
