//! Git operations for pickwise.
//!
//! [`VcsBackend`] is the seam between the replay engine and the repository.
//! [`GitClient`] implements it on top of `git2`; tests substitute a
//! recording mock.

pub mod client;

pub use client::GitClient;

use crate::errors::GitError;
use crate::models::{CommitInfo, ReplayOptions, ReplayOutcome};

/// The version-control operations the replay engine relies on.
pub trait VcsBackend {
    /// True when tracked files differ from HEAD or a merge / cherry-pick is
    /// in progress.
    fn is_dirty(&self) -> Result<bool, GitError>;

    /// Switch the working copy to a local branch.
    fn checkout(&self, branch: &str) -> Result<(), GitError>;

    /// Commits reachable from `source` but not from `target`, oldest first.
    fn list_commits(&self, source: &str, target: &str) -> Result<Vec<CommitInfo>, GitError>;

    /// Replay one commit onto HEAD.
    ///
    /// Never fails: anything that is not a clean apply or a content conflict
    /// comes back as [`ReplayOutcome::CommandError`].
    fn replay(&self, commit: &CommitInfo, options: &ReplayOptions) -> ReplayOutcome;

    /// Paths with unmerged index entries, sorted.
    fn conflicted_paths(&self) -> Result<Vec<String>, GitError>;

    /// Restore HEAD, index and working tree to the state before `replay`.
    fn abort_replay(&self) -> Result<(), GitError>;

    /// Unified diff of `path` between two refs.
    fn diff(&self, ref_a: &str, ref_b: &str, path: &str) -> Result<String, GitError>;

    /// Commits on `branch` that changed `path`, newest first.
    fn history(&self, branch: &str, path: &str) -> Result<Vec<CommitInfo>, GitError>;
}
