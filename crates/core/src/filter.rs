//! Commit selection by message pattern.
//!
//! Matching is literal, case-sensitive substring containment. There is no
//! regex or glob syntax: `"fix(ui)"` matches exactly those characters.

use crate::models::CommitInfo;

/// True when `message` contains `pattern`. An empty pattern matches all.
pub fn matches(message: &str, pattern: &str) -> bool {
    message.contains(pattern)
}

/// Keep the commits whose message contains `pattern`, preserving order.
pub fn filter_commits(commits: Vec<CommitInfo>, pattern: &str) -> Vec<CommitInfo> {
    commits.into_iter().filter(|c| matches(&c.message, pattern)).collect()
}
