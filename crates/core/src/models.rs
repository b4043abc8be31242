//! Domain model types shared by the backend, the replay engine and the CLI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// Read-only view of a single commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitInfo {
    pub sha: String,
    pub short_sha: String,
    pub author_name: String,
    pub author_email: String,
    /// Committer timestamp.
    pub time: DateTime<Utc>,
    pub message: String,
    /// Paths changed relative to the first parent (every path for a root
    /// commit).
    #[serde(default)]
    pub changed_paths: Vec<String>,
}

impl CommitInfo {
    /// First line of the commit message.
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("").trim_end()
    }
}

// ---------------------------------------------------------------------------
// Replay outcome
// ---------------------------------------------------------------------------

/// Result of replaying one commit onto the current branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ReplayOutcome {
    /// The commit applied cleanly and a new commit was created.
    Applied { new_sha: String },
    /// The replay left unmerged paths in the index.
    Conflict { paths: Vec<String> },
    /// The replay could not be attempted or completed for a reason other
    /// than a content conflict (merge commit without mainline, empty
    /// result, libgit2 failure).
    CommandError { reason: String },
}

impl ReplayOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }
}

impl std::fmt::Display for ReplayOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied { new_sha } => write!(f, "applied as {}", new_sha),
            Self::Conflict { paths } => write!(f, "conflict in {} file(s)", paths.len()),
            Self::CommandError { reason } => write!(f, "failed: {}", reason),
        }
    }
}

// ---------------------------------------------------------------------------
// Replay options
// ---------------------------------------------------------------------------

/// Knobs that change how a single commit is replayed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayOptions {
    /// Append `(cherry picked from commit <sha>)` to the message.
    #[serde(default)]
    pub record_origin: bool,

    /// Parent number (1-based) to diff against when replaying a merge.
    #[serde(default)]
    pub mainline: Option<u32>,

    /// Keep commits whose replay produces no change.
    #[serde(default)]
    pub allow_empty: bool,
}

/// Message suffix written when `record_origin` is set.
pub fn origin_trailer(sha: &str) -> String {
    format!("(cherry picked from commit {})", sha)
}
