//! Context gathering for files left unmerged by a failed replay.
//!
//! For every conflicted path the diagnostics collect the path's history on
//! the target branch, its history on the source branch, and the diff of the
//! path between the two. No resolution is attempted.

use tracing::{debug, info, warn};

use crate::errors::GitError;
use crate::git::VcsBackend;
use crate::models::CommitInfo;

/// Everything printed about one conflicted file.
///
/// Each section is read independently; a failure in one (for example a ref
/// that cannot be resolved) does not hide the others.
#[derive(Debug)]
pub struct FileDiagnosis {
    pub path: String,
    pub target_history: Result<Vec<CommitInfo>, GitError>,
    pub source_history: Result<Vec<CommitInfo>, GitError>,
    /// Diff of `path` from the target branch to the source branch.
    pub diff: Result<String, GitError>,
}

impl FileDiagnosis {
    /// True when every section was read.
    pub fn is_complete(&self) -> bool {
        self.target_history.is_ok() && self.source_history.is_ok() && self.diff.is_ok()
    }
}

/// Collect a [`FileDiagnosis`] for each path, in the given order.
pub fn diagnose<B: VcsBackend + ?Sized>(
    backend: &B,
    source: &str,
    target: &str,
    paths: &[String],
) -> Vec<FileDiagnosis> {
    info!(count = paths.len(), source, target, "diagnosing conflicted files");
    paths
        .iter()
        .map(|path| {
            let diagnosis = FileDiagnosis {
                path: path.clone(),
                target_history: backend.history(target, path),
                source_history: backend.history(source, path),
                diff: backend.diff(target, source, path),
            };
            if diagnosis.is_complete() {
                debug!(path = %path, "diagnosis complete");
            } else {
                warn!(path = %path, "diagnosis incomplete");
            }
            diagnosis
        })
        .collect()
}
