//! Terminal rendering of replay progress and conflict diagnostics.

use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

use pickwise_core::conflict::FileDiagnosis;
use pickwise_core::models::CommitInfo;
use pickwise_core::{ReplayReporter, ReplayRequest};

use super::style;

const RULE_WIDTH: usize = 50;
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Prints each replay event to stdout as it happens.
pub struct TerminalReporter;

impl ReplayReporter for TerminalReporter {
    fn on_plan(&mut self, request: &ReplayRequest, commits: &[CommitInfo]) {
        println!("{}", plan_line(request, commits.len()));
    }

    fn on_applied(&mut self, commit: &CommitInfo, new_sha: &str) {
        println!("{}", applied_line(commit, new_sha));
    }

    fn on_conflict(&mut self, commit: &CommitInfo, diagnoses: &[FileDiagnosis]) {
        println!("{}", style::error(&failed_line(commit)));
        for diagnosis in diagnoses {
            print!("{}", render_diagnosis(diagnosis));
        }
    }

    fn on_command_error(&mut self, commit: &CommitInfo, reason: &str) {
        println!("{}", style::error(&failed_line(commit)));
        println!("  {}", style::dim(reason));
    }
}

pub fn plan_line(request: &ReplayRequest, count: usize) -> String {
    if count == 0 {
        return style::dim(&format!(
            "No commits in {}..{} match '{}'",
            request.target, request.source, request.pattern
        ));
    }
    style::header(&format!(
        "Replaying {} commit(s) from {} onto {} matching '{}'",
        count, request.source, request.target, request.pattern
    ))
}

pub fn applied_line(commit: &CommitInfo, new_sha: &str) -> String {
    let new_short = &new_sha[..new_sha.len().min(7)];
    style::success(&format!(
        "Cherry-picked {} {} as {}",
        commit.summary(),
        style::sha(&commit.short_sha),
        style::sha(new_short)
    ))
}

fn failed_line(commit: &CommitInfo) -> String {
    format!("Cherry-picking commit {} {} failed", commit.summary(), commit.sha)
}

/// Commit log entries in the order given.
pub fn render_history(commits: &[CommitInfo]) -> String {
    let mut out = String::new();
    for commit in commits {
        out.push_str(&format!("Commit: {}\n", commit.sha));
        out.push_str(&format!("Author: {} <{}>\n", commit.author_name, commit.author_email));
        out.push_str(&format!("Date: {}\n", commit.time.format(DATE_FORMAT)));
        out.push_str(&format!("Message: {}\n", commit.message.trim_end()));
        if !commit.changed_paths.is_empty() {
            out.push_str(&format!("Files: {}\n", commit.changed_paths.join(", ")));
        }
        out.push_str(&"-".repeat(RULE_WIDTH));
        out.push('\n');
    }
    if commits.is_empty() {
        out.push_str(&style::dim("(no commits touch this file)"));
        out.push('\n');
    }
    out
}

/// Full diagnostic block for one conflicted file.
pub fn render_diagnosis(diagnosis: &FileDiagnosis) -> String {
    let mut out = String::new();
    out.push_str(&style::warn(&format!("Conflicts in file: {}", diagnosis.path)));
    out.push('\n');

    out.push_str("Target branch commit history:\n");
    match &diagnosis.target_history {
        Ok(commits) => out.push_str(&render_history(commits)),
        Err(e) => out.push_str(&unavailable(e)),
    }
    out.push_str(&"=".repeat(RULE_WIDTH));
    out.push('\n');

    out.push_str("Source branch commit history:\n");
    match &diagnosis.source_history {
        Ok(commits) => out.push_str(&render_history(commits)),
        Err(e) => out.push_str(&unavailable(e)),
    }

    out.push_str("Differences between branches:\n");
    match &diagnosis.diff {
        Ok(diff) if diff.is_empty() => out.push_str("No differences found.\n"),
        Ok(diff) => {
            out.push_str(&style::diff(diff));
            out.push('\n');
        }
        Err(e) => out.push_str(&unavailable(e)),
    }
    out
}

fn unavailable(err: &dyn std::fmt::Display) -> String {
    format!("{}\n", style::warn(&format!("unavailable: {}", err)))
}

/// Table of commits for `--dry-run`.
pub fn plan_table(commits: &[CommitInfo]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["SHA", "Date", "Author", "Message", "Files"]);

    for c in commits {
        table.add_row(vec![
            Cell::new(&c.short_sha),
            Cell::new(c.time.format("%Y-%m-%d").to_string()),
            Cell::new(&c.author_name),
            Cell::new(c.summary()),
            Cell::new(files_cell(&c.changed_paths)),
        ]);
    }
    table
}

fn files_cell(paths: &[String]) -> String {
    const SHOWN: usize = 3;
    match paths.len() {
        0 => "-".to_string(),
        n if n <= SHOWN => paths.join(", "),
        n => format!("{}, +{} more", paths[..SHOWN].join(", "), n - SHOWN),
    }
}
