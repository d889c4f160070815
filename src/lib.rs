//! # sherpa-worktree
//!
//! A worktree lifecycle manager: creates a branch for an issue with
//! [gh-sherpa](https://github.com/InditexTech/gh-sherpa), binds a git worktree to it, lists
//! worktrees, and removes them one at a time or all at once.
//!
//! ## Quick Start
//!
//! ```bash
//! # Load the `swt` wrapper so the shell follows directory changes
//! eval "$(sherpa-worktree --init bash)"
//!
//! # Create a branch for PROJ-123 and a worktree under .worktrees/
//! swt --issue PROJ-123
//!
//! # List worktrees
//! swt --list
//!
//! # Remove one (menu when no name is given), or all of them
//! swt --clean feature-PROJ-123
//! swt --clean-all
//! ```
//!
//! ## Module Structure
//!
//! - [`commands`] - One module per operating mode (create, list, remove, remove-all, init)
//! - [`git`] - Git access: git2 for reads and worktree creation, the git CLI for removal
//! - [`sherpa`] - The external branch-naming command
//! - [`storage`] - Where worktrees live on disk and cleanup of leftover directories
//! - [`config`] - Layered settings from files and environment
//! - [`location`] - The operator's current directory, threaded through every command
//! - [`selection`] - Abstracts interactive prompts for testability
//! - [`traits`] - Seams for git and the branch tool
//! - [`error`] - Typed failures the commands report

pub mod commands;
pub mod config;
pub mod error;
pub mod git;
pub mod location;
pub mod selection;
pub mod sherpa;
pub mod storage;
pub mod traits;

pub use anyhow::Result;
