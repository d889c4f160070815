//! Test support utilities for sherpa-worktree integration tests
//!
//! Provides a throwaway git repository, a scripted stand-in for the branch tool,
//! and a command builder wired to both. Used only during development.

pub mod test_env;

pub use test_env::CliTestEnvironment;
