use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::location::normalize;

/// Where worktrees live on disk: `<repo root>/<worktrees dir>/<branch>`
#[derive(Debug, Clone)]
pub struct WorktreeStorage {
    root_dir: PathBuf,
}

impl WorktreeStorage {
    #[must_use]
    pub fn new(repo_root: &Path, settings: &Settings) -> Self {
        Self {
            root_dir: normalize(&repo_root.join(&settings.worktrees_dir)),
        }
    }

    fn sanitize_branch_name(branch_name: &str) -> String {
        branch_name.replace(['/', '\\', ':', '*', '?', '"', '<', '>', '|'], "-")
    }

    #[must_use]
    pub fn get_worktree_path(&self, branch_name: &str) -> PathBuf {
        self.root_dir.join(Self::sanitize_branch_name(branch_name))
    }

    #[must_use]
    pub fn get_root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// Creates the container directory if it is missing
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created
    pub fn ensure_root_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root_dir).with_context(|| {
            format!(
                "Failed to create worktrees directory: {}",
                self.root_dir.display()
            )
        })
    }

    /// Deletes whatever git left of a removed worktree, then any parent
    /// directories under the container that are now empty
    ///
    /// # Errors
    /// Returns an error if the leftover worktree directory cannot be deleted
    pub fn remove_leftovers(&self, worktree_path: &Path) -> Result<()> {
        if worktree_path.exists() {
            fs::remove_dir_all(worktree_path).with_context(|| {
                format!(
                    "Failed to remove worktree directory: {}",
                    worktree_path.display()
                )
            })?;
        }

        let mut parent = worktree_path.parent();
        while let Some(dir) = parent {
            if !dir.starts_with(&self.root_dir) || dir == self.root_dir {
                break;
            }
            if !is_empty_dir(dir) || fs::remove_dir(dir).is_err() {
                break;
            }
            tracing::debug!(dir = %dir.display(), "removed empty directory");
            parent = dir.parent();
        }

        Ok(())
    }

    /// Removes the container directory when nothing is left in it
    ///
    /// Returns whether it was removed.
    #[must_use]
    pub fn remove_root_dir_if_empty(&self) -> bool {
        is_empty_dir(&self.root_dir) && fs::remove_dir(&self.root_dir).is_ok()
    }
}

fn is_empty_dir(dir: &Path) -> bool {
    fs::read_dir(dir)
        .map(|mut entries| entries.next().is_none())
        .unwrap_or(false)
}
