use anyhow::{Context, Result};
use git2::{BranchType, Repository};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::WorktreeError;
use crate::traits::GitOperations;

/// A linked worktree as seen by one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorktreeRecord {
    pub path: PathBuf,
    /// `None` when the worktree's HEAD is detached or cannot be read
    pub branch: Option<String>,
}

impl WorktreeRecord {
    pub const UNKNOWN_BRANCH: &'static str = "unknown";

    #[must_use]
    pub fn branch_label(&self) -> &str {
        self.branch.as_deref().unwrap_or(Self::UNKNOWN_BRANCH)
    }

    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// What the main working tree had checked out before the branch tool ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadState {
    Branch(String),
    Detached(String),
}

impl HeadState {
    #[must_use]
    pub fn branch(&self) -> Option<&str> {
        match self {
            HeadState::Branch(name) => Some(name),
            HeadState::Detached(_) => None,
        }
    }
}

impl fmt::Display for HeadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HeadState::Branch(name) => write!(f, "{}", name),
            HeadState::Detached(oid) => write!(f, "detached at {}", oid),
        }
    }
}

/// One porcelain block, before branch resolution
#[derive(Debug, Default, PartialEq, Eq)]
struct PorcelainEntry {
    path: PathBuf,
    branch: Option<String>,
    bare: bool,
}

/// Parses `git worktree list --porcelain`.
///
/// Blocks are separated by blank lines; the first block is the main working
/// tree.
fn parse_porcelain(output: &str) -> Vec<PorcelainEntry> {
    let mut entries = Vec::new();
    let mut current: Option<PorcelainEntry> = None;

    for line in output.lines() {
        if let Some(path) = line.strip_prefix("worktree ") {
            if let Some(entry) = current.take() {
                entries.push(entry);
            }
            current = Some(PorcelainEntry {
                path: PathBuf::from(path),
                ..PorcelainEntry::default()
            });
        } else if let Some(entry) = current.as_mut() {
            if let Some(reference) = line.strip_prefix("branch ") {
                entry.branch = Some(
                    reference
                        .strip_prefix("refs/heads/")
                        .unwrap_or(reference)
                        .to_string(),
                );
            } else if line == "bare" {
                entry.bare = true;
            }
        }
    }

    if let Some(entry) = current {
        entries.push(entry);
    }

    entries
}

/// Reads the branch a worktree directory currently has checked out
fn read_worktree_branch(path: &Path) -> Option<String> {
    let repo = Repository::open(path).ok()?;
    let head = repo.head().ok()?;
    if !head.is_branch() {
        return None;
    }
    head.shorthand().map(str::to_string)
}

fn run_git(repo_path: &Path, args: &[&str]) -> Result<String> {
    tracing::debug!(cwd = %repo_path.display(), "git {}", args.join(" "));
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_path)
        .args(args)
        .output()
        .with_context(|| format!("Failed to run git {}", args.join(" ")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!(
            "git {} failed (exit code {}): {}",
            args.join(" "),
            output.status.code().unwrap_or(-1),
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

pub struct GitRepo {
    repo: Repository,
    root: PathBuf,
}

impl GitRepo {
    /// Opens the repository containing `path`, resolving to the main working tree
    ///
    /// # Errors
    /// Returns an error if:
    /// - The path is not inside a git working tree
    /// - The repository is bare
    pub fn open(path: &Path) -> Result<Self> {
        let discovered = Repository::discover(path)
            .map_err(|_| WorktreeError::NotARepository(path.to_path_buf()))?;
        if discovered.is_bare() {
            return Err(WorktreeError::NotARepository(path.to_path_buf()).into());
        }

        let root = if discovered.is_worktree() {
            // commondir is `<main>/.git/` for a linked worktree
            discovered
                .commondir()
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| WorktreeError::NotARepository(path.to_path_buf()))?
        } else {
            discovered
                .workdir()
                .map(Path::to_path_buf)
                .ok_or_else(|| WorktreeError::NotARepository(path.to_path_buf()))?
        };
        let root = root.canonicalize().unwrap_or(root);

        let repo = if discovered.is_worktree() {
            Repository::open(&root).context("Failed to open main working tree")?
        } else {
            discovered
        };

        tracing::debug!(root = %root.display(), "opened repository");
        Ok(Self { repo, root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lists linked worktrees, skipping the main working tree and bare entries
    ///
    /// # Errors
    /// Returns an error if `git worktree list` fails
    pub fn list_worktrees(&self) -> Result<Vec<WorktreeRecord>> {
        let output = run_git(&self.root, &["worktree", "list", "--porcelain"])?;
        let records = parse_porcelain(&output)
            .into_iter()
            .skip(1)
            .filter(|entry| !entry.bare)
            .map(|entry| {
                let branch = read_worktree_branch(&entry.path);
                if branch.is_none() {
                    tracing::debug!(
                        path = %entry.path.display(),
                        registered = ?entry.branch,
                        "could not read worktree HEAD"
                    );
                }
                WorktreeRecord {
                    path: entry.path,
                    branch,
                }
            })
            .collect();
        Ok(records)
    }

    /// Reads what the main working tree has checked out
    ///
    /// # Errors
    /// Returns an error if HEAD cannot be read (e.g. an unborn branch)
    pub fn head_state(&self) -> Result<HeadState> {
        let head = self.repo.head().context("Failed to read HEAD")?;
        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(HeadState::Branch(name.to_string()));
            }
        }
        let commit = head.peel_to_commit().context("HEAD does not point to a commit")?;
        Ok(HeadState::Detached(commit.id().to_string()))
    }

    /// Checks `state` out again in the main working tree
    ///
    /// # Errors
    /// Returns an error if the checkout is refused
    pub fn restore_head(&self, state: &HeadState) -> Result<()> {
        match state {
            HeadState::Branch(name) => {
                run_git(&self.root, &["checkout", "-q", name.as_str(), "--"])?
            }
            HeadState::Detached(oid) => {
                run_git(&self.root, &["checkout", "-q", "--detach", oid.as_str()])?
            }
        };
        Ok(())
    }

    /// Resolves the remote's default branch from `refs/remotes/origin/HEAD`
    ///
    /// # Errors
    /// Returns an error if the reference exists but cannot be read
    pub fn default_branch(&self) -> Result<Option<String>> {
        let reference = match self.repo.find_reference("refs/remotes/origin/HEAD") {
            Ok(reference) => reference,
            Err(e) if e.code() == git2::ErrorCode::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(reference
            .symbolic_target()
            .and_then(|target| target.strip_prefix("refs/remotes/origin/"))
            .map(str::to_string))
    }

    /// Lists all local branches in the repository
    ///
    /// # Errors
    /// Returns an error if git operations fail
    pub fn list_local_branches(&self) -> Result<Vec<String>> {
        let branches = self.repo.branches(Some(BranchType::Local))?;
        let mut branch_names = Vec::new();

        for branch_result in branches {
            let (branch, _) = branch_result?;
            if let Some(name) = branch.name()? {
                branch_names.push(name.to_string());
            }
        }

        Ok(branch_names)
    }

    /// Creates a worktree at `worktree_path` bound to an existing branch
    ///
    /// # Errors
    /// Returns an error if:
    /// - The branch doesn't exist
    /// - The branch is checked out elsewhere or the path is taken
    pub fn add_worktree(&self, branch_name: &str, worktree_path: &Path) -> Result<()> {
        let branch = self
            .repo
            .find_branch(branch_name, BranchType::Local)
            .with_context(|| format!("Failed to find branch '{}'", branch_name))?;

        // The directory name doubles as git's administrative worktree name
        let worktree_name = worktree_path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(branch_name);

        let mut opts = git2::WorktreeAddOptions::new();
        opts.reference(Some(branch.get()));

        tracing::debug!(branch = branch_name, path = %worktree_path.display(), "adding worktree");
        self.repo
            .worktree(worktree_name, worktree_path, Some(&opts))
            .with_context(|| format!("Failed to add worktree '{}'", worktree_name))?;

        Ok(())
    }

    /// Runs `git worktree remove`, with `--force` when asked
    ///
    /// # Errors
    /// Returns an error if git refuses the removal
    pub fn remove_worktree(&self, worktree_path: &Path, force: bool) -> Result<()> {
        let path = worktree_path.to_string_lossy().to_string();
        let mut args = vec!["worktree", "remove"];
        if force {
            args.push("--force");
        }
        args.push(path.as_str());
        run_git(&self.root, &args)?;
        Ok(())
    }

    /// Deletes a branch from the repository
    ///
    /// # Errors
    /// Returns an error if:
    /// - Branch doesn't exist
    /// - Git operations fail
    pub fn delete_branch(&self, branch_name: &str) -> Result<()> {
        let mut branch = self.repo.find_branch(branch_name, BranchType::Local)?;
        branch.delete()?;
        Ok(())
    }
}

impl GitOperations for GitRepo {
    fn root(&self) -> PathBuf {
        self.root().to_path_buf()
    }

    fn list_worktrees(&self) -> Result<Vec<WorktreeRecord>> {
        self.list_worktrees()
    }

    fn head_state(&self) -> Result<HeadState> {
        self.head_state()
    }

    fn restore_head(&self, state: &HeadState) -> Result<()> {
        self.restore_head(state)
    }

    fn default_branch(&self) -> Result<Option<String>> {
        self.default_branch()
    }

    fn list_local_branches(&self) -> Result<Vec<String>> {
        self.list_local_branches()
    }

    fn add_worktree(&self, branch_name: &str, worktree_path: &Path) -> Result<()> {
        self.add_worktree(branch_name, worktree_path)
    }

    fn remove_worktree(&self, worktree_path: &Path, force: bool) -> Result<()> {
        self.remove_worktree(worktree_path, force)
    }

    fn delete_branch(&self, branch_name: &str) -> Result<()> {
        self.delete_branch(branch_name)
    }
}
