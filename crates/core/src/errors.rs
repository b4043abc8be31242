//! Error types for the pickwise core library.
//!
//! Each subsystem has its own error type derived with `thiserror`. Replay
//! errors wrap Git errors; the CLI reports any of them through `anyhow`.

use thiserror::Error;

// ---------------------------------------------------------------------------
// Git errors
// ---------------------------------------------------------------------------

/// Errors from local Git (git2) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The repository path does not exist or is not a git repo.
    #[error("git repository not found at '{0}'")]
    RepositoryNotFound(String),

    /// A `git2` library error.
    #[error("git2 error: {0}")]
    Git2Error(#[from] git2::Error),

    /// A branch could not be resolved.
    #[error("git branch not found: {0}")]
    BranchNotFound(String),

    /// A ref (branch, tag, SHA) could not be resolved.
    #[error("git ref not found: {0}")]
    RefNotFound(String),

    /// HEAD does not point at a branch.
    #[error("HEAD is detached; check out a branch first")]
    DetachedHead,

    /// Generic I/O wrapper.
    #[error("git I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

/// Errors from configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file not found.
    #[error("configuration file not found: {0}")]
    FileNotFound(String),

    /// TOML parse error.
    #[error("configuration parse error: {0}")]
    ParseError(String),

    /// A config value is invalid.
    #[error("invalid configuration value for '{field}': {detail}")]
    InvalidValue {
        field: String,
        detail: String,
    },

    /// Generic I/O error reading the config file.
    #[error("configuration I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Replay errors
// ---------------------------------------------------------------------------

/// Errors that stop a replay run before or between replays.
///
/// Conflicts and failed cherry-picks are not errors: they are reported as
/// [`crate::models::ReplayOutcome`] values and end the run normally.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// The working copy has uncommitted changes to tracked files.
    #[error("Repository has uncommitted changes.")]
    DirtyWorkingCopy,

    /// Underlying Git error.
    #[error("replay Git error: {0}")]
    GitError(#[from] GitError),
}
