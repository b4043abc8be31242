//! Selective commit replay between two branches.
//!
//! The [`ReplayEngine`] runs one pass:
//!
//! 1. Refuse to start when the working copy is dirty.
//! 2. Check out the target branch.
//! 3. Collect `target..source`, oldest first, and keep the commits whose
//!    message contains the pattern.
//! 4. Replay them one by one. The first conflict is diagnosed, the replay
//!    is aborted and the pass ends. A replay command error aborts and ends
//!    the pass without diagnostics.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::conflict::{diagnose, FileDiagnosis};
use crate::errors::ReplayError;
use crate::filter::filter_commits;
use crate::git::VcsBackend;
use crate::models::{CommitInfo, ReplayOptions, ReplayOutcome};

// ---------------------------------------------------------------------------
// Replay state machine
// ---------------------------------------------------------------------------

/// States of a replay pass.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReplayState {
    Idle,
    Replaying,
    AbortedOnConflict,
    AbortedOnError,
}

impl std::fmt::Display for ReplayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Replaying => write!(f, "replaying"),
            Self::AbortedOnConflict => write!(f, "aborted_on_conflict"),
            Self::AbortedOnError => write!(f, "aborted_on_error"),
        }
    }
}

// ---------------------------------------------------------------------------
// Request / report
// ---------------------------------------------------------------------------

/// What to replay: commits in `target..source` whose message contains
/// `pattern`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRequest {
    pub source: String,
    pub target: String,
    pub pattern: String,
}

impl ReplayRequest {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        pattern: impl Into<String>,
    ) -> Self {
        Self { source: source.into(), target: target.into(), pattern: pattern.into() }
    }
}

/// A commit that was replayed, with the SHA of its copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedCommit {
    pub original: CommitInfo,
    pub new_sha: String,
}

/// Why a pass ended.
#[derive(Debug)]
pub enum StopReason {
    /// Every matching commit was replayed (possibly none).
    Completed,
    /// `commit` left unmerged paths; the replay was aborted.
    Conflict {
        commit: CommitInfo,
        diagnoses: Vec<FileDiagnosis>,
    },
    /// `commit` could not be replayed; the replay was aborted.
    CommandError {
        commit: CommitInfo,
        reason: String,
    },
}

/// Summary of one pass.
#[derive(Debug)]
pub struct RunReport {
    /// Commits that matched the pattern, in replay order.
    pub matched: Vec<CommitInfo>,
    /// Commits replayed before the pass ended.
    pub applied: Vec<AppliedCommit>,
    pub stop: StopReason,
}

impl RunReport {
    pub fn is_completed(&self) -> bool {
        matches!(self.stop, StopReason::Completed)
    }
}

// ---------------------------------------------------------------------------
// Reporter
// ---------------------------------------------------------------------------

/// Progress callbacks, invoked while the pass runs.
pub trait ReplayReporter {
    /// The matching commits are known; nothing has been replayed yet.
    fn on_plan(&mut self, _request: &ReplayRequest, _commits: &[CommitInfo]) {}

    fn on_applied(&mut self, _commit: &CommitInfo, _new_sha: &str) {}

    /// Called before the replay is aborted.
    fn on_conflict(&mut self, _commit: &CommitInfo, _diagnoses: &[FileDiagnosis]) {}

    /// Called before the replay is aborted.
    fn on_command_error(&mut self, _commit: &CommitInfo, _reason: &str) {}
}

/// Reporter that discards every event.
impl ReplayReporter for () {}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Drives a replay pass against any [`VcsBackend`].
pub struct ReplayEngine<B: VcsBackend> {
    backend: B,
    options: ReplayOptions,
    state: ReplayState,
}

impl<B: VcsBackend> ReplayEngine<B> {
    pub fn new(backend: B, options: ReplayOptions) -> Self {
        debug!(?options, "initializing replay engine");
        Self { backend, options, state: ReplayState::Idle }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn state(&self) -> ReplayState {
        self.state
    }

    /// The commits a pass would replay. Reads only: no cleanliness check,
    /// no checkout.
    pub fn plan(&self, request: &ReplayRequest) -> Result<Vec<CommitInfo>, ReplayError> {
        let commits = self.backend.list_commits(&request.source, &request.target)?;
        let total = commits.len();
        let matched = filter_commits(commits, &request.pattern);
        info!(
            source = %request.source,
            target = %request.target,
            total,
            matched = matched.len(),
            "selected commits"
        );
        Ok(matched)
    }

    /// Execute one pass.
    ///
    /// Conflicts and replay command errors end the pass through
    /// [`RunReport::stop`]; only precondition and repository failures are
    /// returned as `Err`.
    pub fn run(
        &mut self,
        request: &ReplayRequest,
        reporter: &mut dyn ReplayReporter,
    ) -> Result<RunReport, ReplayError> {
        if self.backend.is_dirty()? {
            warn!("working copy is dirty, refusing to replay");
            return Err(ReplayError::DirtyWorkingCopy);
        }

        self.backend.checkout(&request.target)?;
        let matched = self.plan(request)?;
        reporter.on_plan(request, &matched);

        self.state = ReplayState::Replaying;
        let mut applied = Vec::with_capacity(matched.len());

        let mut stop = StopReason::Completed;
        for commit in &matched {
            match self.backend.replay(commit, &self.options) {
                ReplayOutcome::Applied { new_sha } => {
                    reporter.on_applied(commit, &new_sha);
                    applied.push(AppliedCommit { original: commit.clone(), new_sha });
                }
                ReplayOutcome::Conflict { paths } => {
                    let diagnoses =
                        diagnose(&self.backend, &request.source, &request.target, &paths);
                    reporter.on_conflict(commit, &diagnoses);
                    self.backend.abort_replay()?;
                    self.state = ReplayState::AbortedOnConflict;
                    info!(sha = %commit.short_sha, applied = applied.len(), "pass stopped on conflict");
                    stop = StopReason::Conflict { commit: commit.clone(), diagnoses };
                    break;
                }
                ReplayOutcome::CommandError { reason } => {
                    reporter.on_command_error(commit, &reason);
                    self.backend.abort_replay()?;
                    self.state = ReplayState::AbortedOnError;
                    info!(sha = %commit.short_sha, applied = applied.len(), "pass stopped on replay error");
                    stop = StopReason::CommandError { commit: commit.clone(), reason };
                    break;
                }
            }
        }

        if matches!(stop, StopReason::Completed) {
            self.state = ReplayState::Idle;
            info!(applied = applied.len(), "pass completed");
        }
        Ok(RunReport { matched, applied, stop })
    }
}
