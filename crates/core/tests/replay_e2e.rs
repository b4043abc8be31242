//! End-to-end tests for the replay engine against real repositories.
//!
//! Each test builds a scratch repository with `git2` inside a `TempDir`,
//! runs a full pass through [`ReplayEngine`] with the real [`GitClient`],
//! and inspects the resulting branch.

use std::path::Path;

use git2::{Commit, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

use pickwise_core::errors::ReplayError;
use pickwise_core::models::ReplayOptions;
use pickwise_core::{GitClient, ReplayEngine, ReplayRequest, StopReason, VcsBackend};

// ===========================================================================
// Helpers
// ===========================================================================

fn init_repo() -> (TempDir, Repository) {
    let dir = tempfile::tempdir().unwrap();
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("main");
    let repo = Repository::init_opts(dir.path(), &opts).unwrap();
    let mut cfg = repo.config().unwrap();
    cfg.set_str("user.name", "Release Bot").unwrap();
    cfg.set_str("user.email", "bot@example.com").unwrap();
    (dir, repo)
}

fn commit_file(repo: &Repository, path: &str, content: &str, message: &str) {
    let workdir = repo.workdir().unwrap();
    let full = workdir.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&full, content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Dev", "dev@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents).unwrap();
}

fn switch(repo: &Repository, branch: &str) {
    let refname = format!("refs/heads/{}", branch);
    let obj = repo.revparse_single(&refname).unwrap();
    repo.checkout_tree(&obj, Some(git2::build::CheckoutBuilder::new().force())).unwrap();
    repo.set_head(&refname).unwrap();
}

fn branch_here(repo: &Repository, name: &str) {
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    repo.branch(name, &head, false).unwrap();
}

fn messages_on(repo: &Repository, branch: &str) -> Vec<String> {
    let tip = repo.revparse_single(branch).unwrap().peel_to_commit().unwrap();
    let mut walk = repo.revwalk().unwrap();
    walk.set_sorting(git2::Sort::TOPOLOGICAL).unwrap();
    walk.push(tip.id()).unwrap();
    walk.map(|oid| {
        let c = repo.find_commit(oid.unwrap()).unwrap();
        c.summary().unwrap_or("").to_string()
    })
    .collect()
}

/// Commits `path` on top of HEAD as a merge of HEAD and `other`.
fn commit_merge(repo: &Repository, other: &str, path: &str, content: &str, message: &str) {
    std::fs::write(repo.workdir().unwrap().join(path), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(path)).unwrap();
    index.write().unwrap();
    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = Signature::now("Dev", "dev@example.com").unwrap();
    let head = repo.head().unwrap().peel_to_commit().unwrap();
    let side = repo.revparse_single(other).unwrap().peel_to_commit().unwrap();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&head, &side]).unwrap();
}

/// `release` holds the base; `develop` adds five commits, three of them
/// tagged `[hotfix]`. `release` also edits `app.txt` so that the second
/// hotfix, which edits the same line, conflicts.
fn release_scenario(conflicting: bool) -> (TempDir, Repository) {
    let (dir, repo) = init_repo();
    commit_file(&repo, "app.txt", "version 1\n", "initial");
    branch_here(&repo, "release");
    branch_here(&repo, "develop");

    switch(&repo, "develop");
    commit_file(&repo, "docs/a.md", "a\n", "[hotfix] docs a");
    commit_file(&repo, "feature.txt", "new feature\n", "big feature");
    commit_file(&repo, "app.txt", "version 2\n", "[hotfix] bump app");
    commit_file(&repo, "docs/b.md", "b\n", "[HOTFIX] wrong case");
    commit_file(&repo, "docs/c.md", "c\n", "[hotfix] docs c");

    switch(&repo, "release");
    if conflicting {
        commit_file(&repo, "app.txt", "version 1.1\n", "release patch");
    }
    switch(&repo, "main");
    (dir, repo)
}

// ===========================================================================
// Tests
// ===========================================================================

#[test]
fn test_replays_matching_commits_onto_target() {
    let (dir, repo) = release_scenario(false);
    let client = GitClient::new(dir.path()).unwrap();
    let mut engine = ReplayEngine::new(client, ReplayOptions { record_origin: true, ..Default::default() });

    let report = engine
        .run(&ReplayRequest::new("develop", "release", "[hotfix]"), &mut ())
        .unwrap();

    assert!(report.is_completed());
    assert_eq!(report.applied.len(), 3);
    assert_eq!(engine.backend().current_branch().unwrap(), "release");
    assert_eq!(
        messages_on(&repo, "release"),
        vec!["[hotfix] docs c", "[hotfix] bump app", "[hotfix] docs a", "initial"]
    );

    let head = repo.revparse_single("release").unwrap().peel_to_commit().unwrap();
    assert!(head.message().unwrap().contains("(cherry picked from commit "));
    assert!(dir.path().join("docs/c.md").exists());
    assert!(!dir.path().join("feature.txt").exists());
    assert!(!dir.path().join("docs/b.md").exists());
}

#[test]
fn test_conflict_stops_and_restores_branch() {
    let (dir, repo) = release_scenario(true);
    let before = repo.revparse_single("release").unwrap().id();
    let client = GitClient::new(dir.path()).unwrap();
    let mut engine = ReplayEngine::new(client, ReplayOptions::default());

    let report = engine
        .run(&ReplayRequest::new("develop", "release", "[hotfix]"), &mut ())
        .unwrap();

    assert_eq!(report.matched.len(), 3);
    assert_eq!(report.applied.len(), 1);
    let StopReason::Conflict { commit, diagnoses } = &report.stop else {
        panic!("expected conflict, got {:?}", report.stop);
    };
    assert_eq!(commit.summary(), "[hotfix] bump app");
    assert_eq!(diagnoses.len(), 1);

    let diag = &diagnoses[0];
    assert_eq!(diag.path, "app.txt");
    let target: Vec<&str> = diag.target_history.as_ref().unwrap().iter().map(|c| c.summary()).collect();
    assert_eq!(target, vec!["release patch", "initial"]);
    let source: Vec<&str> = diag.source_history.as_ref().unwrap().iter().map(|c| c.summary()).collect();
    assert_eq!(source, vec!["[hotfix] bump app", "initial"]);
    let diff = diag.diff.as_ref().unwrap();
    assert!(diff.contains("-version 1.1"));
    assert!(diff.contains("+version 2"));

    // First hotfix stays, the conflicting one is gone, the tree is clean.
    let client = engine.into_backend();
    assert!(!client.is_dirty().unwrap());
    let head = repo.revparse_single("release").unwrap().peel_to_commit().unwrap();
    assert_eq!(head.parent_id(0).unwrap(), before);
    assert_eq!(std::fs::read_to_string(dir.path().join("app.txt")).unwrap(), "version 1.1\n");
    assert!(!dir.path().join("docs/c.md").exists());
}

#[test]
fn test_dirty_working_copy_leaves_branch_alone() {
    let (dir, repo) = release_scenario(false);
    std::fs::write(dir.path().join("app.txt"), "local edit, uncommitted\n").unwrap();
    let client = GitClient::new(dir.path()).unwrap();
    let mut engine = ReplayEngine::new(client, ReplayOptions::default());

    let result = engine.run(&ReplayRequest::new("develop", "release", "[hotfix]"), &mut ());
    assert!(matches!(result, Err(ReplayError::DirtyWorkingCopy)));
    assert_eq!(engine.backend().current_branch().unwrap(), "main");
    assert_eq!(messages_on(&repo, "release"), vec!["initial"]);
}

#[test]
fn test_unknown_target_branch_is_an_error() {
    let (dir, _repo) = release_scenario(false);
    let client = GitClient::new(dir.path()).unwrap();
    let mut engine = ReplayEngine::new(client, ReplayOptions::default());

    let result = engine.run(&ReplayRequest::new("develop", "nope", "[hotfix]"), &mut ());
    assert!(matches!(result, Err(ReplayError::GitError(_))));
}

#[test]
fn test_no_matching_commits() {
    let (dir, repo) = release_scenario(false);
    let client = GitClient::new(dir.path()).unwrap();
    let mut engine = ReplayEngine::new(client, ReplayOptions::default());

    let report = engine
        .run(&ReplayRequest::new("develop", "release", "JIRA-404"), &mut ())
        .unwrap();
    assert!(report.is_completed());
    assert!(report.matched.is_empty());
    assert_eq!(messages_on(&repo, "release"), vec!["initial"]);
}

#[test]
fn test_plan_lists_without_checkout() {
    let (dir, _repo) = release_scenario(false);
    let client = GitClient::new(dir.path()).unwrap();
    let engine = ReplayEngine::new(client, ReplayOptions::default());

    let planned = engine.plan(&ReplayRequest::new("develop", "release", "[hotfix]")).unwrap();
    let summaries: Vec<&str> = planned.iter().map(|c| c.summary()).collect();
    assert_eq!(summaries, vec!["[hotfix] docs a", "[hotfix] bump app", "[hotfix] docs c"]);
    assert_eq!(engine.backend().current_branch().unwrap(), "main");
}

#[test]
fn test_mainline_replays_plain_commits_and_merges() {
    let (dir, repo) = init_repo();
    commit_file(&repo, "app.txt", "version 1\n", "initial");
    branch_here(&repo, "release");
    branch_here(&repo, "develop");
    branch_here(&repo, "side");

    switch(&repo, "side");
    commit_file(&repo, "side.txt", "from side\n", "side work");
    switch(&repo, "develop");
    commit_file(&repo, "plain.txt", "plain\n", "PICK plain");
    commit_merge(&repo, "side", "side.txt", "from side\n", "PICK merge");
    switch(&repo, "main");

    let client = GitClient::new(dir.path()).unwrap();
    let mut engine = ReplayEngine::new(client, ReplayOptions { mainline: Some(1), ..Default::default() });
    let report = engine
        .run(&ReplayRequest::new("develop", "release", "PICK"), &mut ())
        .unwrap();

    assert!(report.is_completed(), "stopped with {:?}", report.stop);
    assert_eq!(report.matched.len(), 2);
    assert_eq!(report.applied.len(), 2);
    assert_eq!(messages_on(&repo, "release"), vec!["PICK merge", "PICK plain", "initial"]);

    // The merge lands as a single-parent commit carrying the side branch's file.
    let head = repo.revparse_single("release").unwrap().peel_to_commit().unwrap();
    assert_eq!(head.parent_count(), 1);
    let tree = head.tree().unwrap();
    assert!(tree.get_path(Path::new("side.txt")).is_ok());
    assert!(tree.get_path(Path::new("plain.txt")).is_ok());
    assert_eq!(std::fs::read_to_string(dir.path().join("side.txt")).unwrap(), "from side\n");
}
