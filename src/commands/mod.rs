//! One module per operating mode; `main` dispatches to exactly one.

pub mod create;
pub mod init;
pub mod list;
pub mod remove;
pub mod remove_all;

use anyhow::Result;

use crate::config::Settings;
use crate::git::GitRepo;
use crate::location::Location;

/// The repository and settings every repository-bound mode starts from
pub struct Workspace {
    pub git: GitRepo,
    pub settings: Settings,
}

impl Workspace {
    /// Opens the repository containing `location` and loads its settings
    ///
    /// # Errors
    /// Returns an error if:
    /// - The location is not inside a git working tree
    /// - A settings file exists but cannot be read
    pub fn open(location: &Location) -> Result<Self> {
        let git = GitRepo::open(location.path())?;
        let settings = Settings::load(git.root())?;
        Ok(Self { git, settings })
    }
}
