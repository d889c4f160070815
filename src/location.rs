use anyhow::{Context, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Set by the shell integration; the final location is written here so the
/// calling shell can `cd` after the binary exits
pub const CD_FILE_ENV: &str = "SHERPA_WORKTREE_CD_FILE";

/// The directory the operator is working in.
///
/// Commands receive the starting location and return where the operator
/// should end up; the process working directory is never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location(PathBuf);

impl Location {
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self(normalize(path))
    }

    /// The process working directory at startup
    ///
    /// # Errors
    /// Returns an error if the working directory cannot be read
    pub fn current() -> Result<Self> {
        let dir = std::env::current_dir().context("Failed to read current directory")?;
        Ok(Self::new(&dir))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }

    #[must_use]
    pub fn is_within(&self, dir: &Path) -> bool {
        self.0.starts_with(normalize(dir))
    }

    /// Moves to `fallback` when the current location is inside `doomed`
    #[must_use]
    pub fn leave(self, doomed: &Path, fallback: &Path) -> Self {
        if self.is_within(doomed) {
            tracing::info!(
                from = %self.0.display(),
                to = %fallback.display(),
                "leaving directory about to be removed"
            );
            Self::new(fallback)
        } else {
            self
        }
    }

    /// Resolves an operator-supplied path relative to this location
    #[must_use]
    pub fn resolve(&self, input: &str) -> PathBuf {
        normalize(&self.0.join(input))
    }
}

/// Canonicalizes `path` when it exists; otherwise cleans `.` and `..`
/// lexically so paths that are about to be created still compare equal
#[must_use]
pub fn normalize(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }

    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(component);
                }
            }
            other => cleaned.push(other),
        }
    }

    // An existing ancestor may still be a symlink
    if let (Some(parent), Some(name)) = (cleaned.parent(), cleaned.file_name()) {
        if let Ok(canonical_parent) = parent.canonicalize() {
            return canonical_parent.join(name);
        }
    }
    cleaned
}

/// Reports the final location to the caller.
///
/// With the shell integration active the path is written to the cd file;
/// otherwise a `cd` hint is printed. Nothing happens when the location did
/// not change.
///
/// # Errors
/// Returns an error if the cd file cannot be written
pub fn hand_off(start: &Location, end: &Location) -> Result<()> {
    if start == end {
        return Ok(());
    }

    match std::env::var_os(CD_FILE_ENV) {
        Some(cd_file) if !cd_file.is_empty() => {
            fs::write(&cd_file, end.path().to_string_lossy().as_bytes()).with_context(|| {
                format!("Failed to write {}", Path::new(&cd_file).display())
            })?;
            tracing::debug!(path = %end.path().display(), "location handed to shell");
        }
        _ => {
            println!("→ cd {}", end.path().display());
        }
    }
    Ok(())
}
