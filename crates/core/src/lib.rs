//! pickwise core library.
//!
//! This crate provides the pieces behind the `pickwise` tool: configuration,
//! the Git backend, message-pattern commit selection, the replay engine and
//! conflict diagnostics.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod filter;
pub mod git;
pub mod models;
pub mod replay_engine;

// Re-exports for convenience.
pub use config::PickConfig;
pub use git::{GitClient, VcsBackend};
pub use replay_engine::{ReplayEngine, ReplayReporter, ReplayRequest, RunReport, StopReason};
