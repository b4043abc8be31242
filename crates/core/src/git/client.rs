//! Local Git repository operations via `git2`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone, Utc};
use git2::{
    build::CheckoutBuilder, BranchType, CherrypickOptions, Commit, DiffFormat, DiffOptions, Oid,
    Repository, RepositoryState, ResetType, Sort, Status, StatusOptions, Tree,
};
use tracing::{debug, info, instrument, warn};

use super::VcsBackend;
use crate::errors::GitError;
use crate::models::{origin_trailer, CommitInfo, ReplayOptions, ReplayOutcome};

/// High-level Git client wrapping a `git2::Repository`.
pub struct GitClient {
    repo: Repository,
    repo_path: PathBuf,
}

impl GitClient {
    /// Open an existing Git repository at `repo_path`.
    pub fn new<P: AsRef<Path>>(repo_path: P) -> Result<Self, GitError> {
        let path = repo_path.as_ref();
        info!(path = %path.display(), "opening git repository");
        let repo = Repository::open(path)
            .map_err(|_| GitError::RepositoryNotFound(path.display().to_string()))?;
        Ok(Self { repo, repo_path: path.to_path_buf() })
    }

    pub fn repo_path(&self) -> &Path { &self.repo_path }
    pub fn repo(&self) -> &Repository { &self.repo }

    /// Return the SHA of HEAD.
    pub fn get_head_sha(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        let commit = head.peel_to_commit()?;
        Ok(commit.id().to_string())
    }

    /// Short name of the branch HEAD points at.
    pub fn current_branch(&self) -> Result<String, GitError> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(GitError::DetachedHead);
        }
        head.shorthand().map(str::to_string).ok_or(GitError::DetachedHead)
    }

    fn resolve_commit(&self, spec: &str) -> Result<Commit<'_>, GitError> {
        let object = self
            .repo
            .revparse_single(spec)
            .map_err(|_| GitError::RefNotFound(spec.to_string()))?;
        Ok(object.peel_to_commit()?)
    }

    fn commit_info(&self, commit: &Commit<'_>) -> Result<CommitInfo, GitError> {
        let sha = commit.id().to_string();
        let author = commit.author();
        Ok(CommitInfo {
            short_sha: sha[..7].to_string(),
            sha,
            author_name: author.name().unwrap_or("Unknown").to_string(),
            author_email: author.email().unwrap_or("").to_string(),
            time: to_utc(commit.time().seconds()),
            message: String::from_utf8_lossy(commit.message_bytes()).into_owned(),
            changed_paths: self.changed_paths(commit)?,
        })
    }

    fn changed_paths(&self, commit: &Commit<'_>) -> Result<Vec<String>, GitError> {
        let tree = commit.tree()?;
        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None
        };
        let diff = self.repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)?;
        let paths = diff
            .deltas()
            .filter_map(|delta| {
                delta
                    .new_file()
                    .path()
                    .or_else(|| delta.old_file().path())
                    .map(|p| p.to_string_lossy().into_owned())
            })
            .collect();
        Ok(paths)
    }

    /// A commit touches `path` when its blob differs from every parent's.
    fn touches(commit: &Commit<'_>, path: &Path) -> Result<bool, GitError> {
        let current = blob_at(&commit.tree()?, path);
        if commit.parent_count() == 0 {
            return Ok(current.is_some());
        }
        for parent in commit.parents() {
            if blob_at(&parent.tree()?, path) == current {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn try_replay(
        &self,
        info: &CommitInfo,
        options: &ReplayOptions,
    ) -> Result<ReplayOutcome, GitError> {
        let commit = self.repo.find_commit(Oid::from_str(&info.sha)?)?;
        let parents = commit.parent_count();

        // A single-parent commit is its own mainline 1; only merges need
        // the parent number passed down to libgit2.
        let mainline = match options.mainline {
            None if parents > 1 => {
                return Ok(command_error(format!(
                    "commit {} is a merge but no mainline was given",
                    info.short_sha
                )));
            }
            Some(m) if m == 0 || m as usize > parents.max(1) => {
                return Ok(command_error(format!(
                    "commit {} does not have parent {}",
                    info.short_sha, m
                )));
            }
            Some(m) if parents > 1 => Some(m),
            _ => None,
        };

        let mut opts = CherrypickOptions::new();
        if let Some(m) = mainline {
            opts.mainline(m);
        }
        self.repo.cherrypick(&commit, Some(&mut opts))?;

        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            let paths = self.conflicted_paths()?;
            info!(count = paths.len(), "replay stopped on conflicts");
            return Ok(ReplayOutcome::Conflict { paths });
        }

        let tree_oid = index.write_tree()?;
        let head = self.repo.head()?.peel_to_commit()?;
        if tree_oid == head.tree_id() && !options.allow_empty {
            return Ok(command_error(format!(
                "the replay of {} is empty; its changes are already on the branch",
                info.short_sha
            )));
        }
        let tree = self.repo.find_tree(tree_oid)?;

        let mut message = String::from_utf8_lossy(commit.message_bytes()).into_owned();
        if options.record_origin {
            message = format!("{}\n\n{}\n", message.trim_end(), origin_trailer(&info.sha));
        }

        let author = commit.author();
        let committer = self.repo.signature().unwrap_or_else(|_| author.to_owned());
        let new_oid = self.repo.commit(Some("HEAD"), &author, &committer, &message, &tree, &[&head])?;
        self.repo.cleanup_state()?;
        info!(new_sha = %new_oid, "replayed commit");
        Ok(ReplayOutcome::Applied { new_sha: new_oid.to_string() })
    }
}

impl VcsBackend for GitClient {
    fn is_dirty(&self) -> Result<bool, GitError> {
        if !matches!(self.repo.state(), RepositoryState::Clean) {
            debug!(state = ?self.repo.state(), "repository has an operation in progress");
            return Ok(true);
        }
        let mut opts = StatusOptions::new();
        opts.include_untracked(false).include_ignored(false).exclude_submodules(true);
        let statuses = self.repo.statuses(Some(&mut opts))?;
        let changed = statuses.iter().filter(|e| e.status() != Status::CURRENT).count();
        debug!(changed, "checked working copy status");
        Ok(changed > 0)
    }

    #[instrument(skip(self))]
    fn checkout(&self, branch: &str) -> Result<(), GitError> {
        let reference = self
            .repo
            .find_branch(branch, BranchType::Local)
            .map_err(|_| GitError::BranchNotFound(branch.to_string()))?
            .into_reference();
        let refname = reference
            .name()
            .ok_or_else(|| GitError::RefNotFound(branch.to_string()))?
            .to_string();
        let commit = reference.peel_to_commit()?;
        self.repo.checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(&refname)?;
        info!(branch, sha = %commit.id(), "checked out branch");
        Ok(())
    }

    #[instrument(skip(self))]
    fn list_commits(&self, source: &str, target: &str) -> Result<Vec<CommitInfo>, GitError> {
        let source_oid = self.resolve_commit(source)?.id();
        let target_oid = self.resolve_commit(target)?.id();

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push(source_oid)?;
        revwalk.hide(target_oid)?;

        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            commits.push(self.commit_info(&commit)?);
        }
        debug!(count = commits.len(), "collected commits in range");
        Ok(commits)
    }

    #[instrument(skip(self, commit, options), fields(sha = %commit.short_sha))]
    fn replay(&self, commit: &CommitInfo, options: &ReplayOptions) -> ReplayOutcome {
        match self.try_replay(commit, options) {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "replay failed");
                command_error(e.to_string())
            }
        }
    }

    fn conflicted_paths(&self) -> Result<Vec<String>, GitError> {
        let index = self.repo.index()?;
        let mut paths = BTreeSet::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let entry = conflict
                .our
                .as_ref()
                .or(conflict.their.as_ref())
                .or(conflict.ancestor.as_ref());
            if let Some(entry) = entry {
                paths.insert(String::from_utf8_lossy(&entry.path).into_owned());
            }
        }
        Ok(paths.into_iter().collect())
    }

    #[instrument(skip(self))]
    fn abort_replay(&self) -> Result<(), GitError> {
        let head = self.repo.head()?.peel_to_commit()?;
        self.repo.reset(head.as_object(), ResetType::Hard, None)?;
        self.repo.cleanup_state()?;
        info!(sha = %head.id(), "aborted replay");
        Ok(())
    }

    fn diff(&self, ref_a: &str, ref_b: &str, path: &str) -> Result<String, GitError> {
        let tree_a = self.resolve_commit(ref_a)?.tree()?;
        let tree_b = self.resolve_commit(ref_b)?.tree()?;

        let mut opts = DiffOptions::new();
        opts.pathspec(path).disable_pathspec_match(true);
        let diff = self.repo.diff_tree_to_tree(Some(&tree_a), Some(&tree_b), Some(&mut opts))?;

        let mut out = String::new();
        diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
            if matches!(line.origin(), '+' | '-' | ' ') {
                out.push(line.origin());
            }
            out.push_str(&String::from_utf8_lossy(line.content()));
            true
        })?;
        Ok(out)
    }

    fn history(&self, branch: &str, path: &str) -> Result<Vec<CommitInfo>, GitError> {
        let tip = self.resolve_commit(branch)?;
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(tip.id())?;

        let path = Path::new(path);
        let mut commits = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if Self::touches(&commit, path)? {
                commits.push(self.commit_info(&commit)?);
            }
        }
        debug!(branch, path = %path.display(), count = commits.len(), "collected file history");
        Ok(commits)
    }
}

fn blob_at(tree: &Tree<'_>, path: &Path) -> Option<Oid> {
    tree.get_path(path).ok().map(|entry| entry.id())
}

fn to_utc(seconds: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(seconds, 0).single().unwrap_or_else(Utc::now)
}

fn command_error(reason: String) -> ReplayOutcome {
    ReplayOutcome::CommandError { reason }
}
