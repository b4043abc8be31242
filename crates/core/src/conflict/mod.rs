//! Conflict diagnostics.
//!
//! When a replay stops on unmerged paths, [`diagnose`] gathers per-file
//! history and diff context for a human to act on.

pub mod diagnostics;

pub use diagnostics::{diagnose, FileDiagnosis};
