//! pickwise command-line tool.
//!
//! Replays the commits of one branch whose message contains a pattern onto
//! another branch. When a replay conflicts, the history and diff of every
//! conflicted file on both branches is printed and the replay is aborted.

mod render;
mod style;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use pickwise_core::models::ReplayOptions;
use pickwise_core::{GitClient, PickConfig, ReplayEngine, ReplayRequest, StopReason};

use render::TerminalReporter;

/// Exit status when the pass stopped on a conflict.
const EXIT_CONFLICT: u8 = 1;
/// Exit status for every other failure.
const EXIT_FAILURE: u8 = 2;

// ---------------------------------------------------------------------------
// CLI argument definitions
// ---------------------------------------------------------------------------

/// Cherry-pick the commits of one branch whose message contains a pattern.
#[derive(Parser, Debug)]
#[command(
    name = "pickwise",
    version,
    about = "Replay commits matching a message pattern from one branch onto another"
)]
struct Cli {
    /// Branch to take commits from.
    branch_from: String,

    /// Branch to replay commits onto. It is checked out first.
    branch_to: String,

    /// Literal, case-sensitive text to look for in commit messages.
    pattern: String,

    /// Path to the Git repository.
    #[arg(short = 'C', long, env = "PICKWISE_REPO")]
    repo: PathBuf,

    /// Path to an optional TOML configuration file.
    #[arg(short, long, env = "PICKWISE_CONFIG")]
    config: Option<PathBuf>,

    /// Append "(cherry picked from commit ...)" to each new message.
    #[arg(short = 'x', long)]
    record_origin: bool,

    /// Parent number to replay merge commits against.
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    mainline: Option<u32>,

    /// Keep commits that become empty when replayed.
    #[arg(long)]
    allow_empty: bool,

    /// List the commits that would be replayed and exit.
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn replay_flags(&self) -> ReplayOptions {
        ReplayOptions {
            record_origin: self.record_origin,
            mainline: self.mainline,
            allow_empty: self.allow_empty,
        }
    }

    fn request(&self) -> ReplayRequest {
        ReplayRequest::new(&self.branch_from, &self.branch_to, &self.pattern)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}", style::error_stderr(&format!("Error: {:#}", e)));
            ExitCode::from(EXIT_FAILURE)
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = PickConfig::load_optional(cli.config.as_ref())
        .context("failed to load configuration file")?;
    config.merge_cli(&cli.replay_flags());

    init_tracing(cli.verbose, &config.output.log_level);
    if !config.output.color {
        console::set_colors_enabled(false);
    }
    debug!(?config, "effective configuration");

    let client = GitClient::new(&cli.repo)
        .with_context(|| format!("failed to open repository at {}", cli.repo.display()))?;
    match client.current_branch() {
        Ok(branch) => debug!(%branch, "starting branch"),
        Err(e) => debug!(error = %e, "no starting branch"),
    }
    let mut engine = ReplayEngine::new(client, config.replay.clone());
    let request = cli.request();

    if cli.dry_run {
        return cmd_plan(&engine, &request);
    }

    let report = engine
        .run(&request, &mut TerminalReporter)
        .with_context(|| format!("failed to replay {} onto {}", request.source, request.target))?;

    let code = match report.stop {
        StopReason::Completed => {
            if !report.applied.is_empty() {
                println!();
                println!(
                    "{}",
                    style::success(&format!(
                        "{} commit(s) replayed onto {}",
                        report.applied.len(),
                        request.target
                    ))
                );
            }
            ExitCode::SUCCESS
        }
        StopReason::Conflict { commit, .. } => {
            println!();
            println!(
                "{}",
                style::warn(&format!(
                    "Stopped at {} after {} of {} commit(s); the replay was aborted",
                    commit.short_sha,
                    report.applied.len(),
                    report.matched.len()
                ))
            );
            ExitCode::from(EXIT_CONFLICT)
        }
        StopReason::CommandError { commit, .. } => {
            println!(
                "{}",
                style::warn(&format!(
                    "Stopped at {} after {} of {} commit(s)",
                    commit.short_sha,
                    report.applied.len(),
                    report.matched.len()
                ))
            );
            ExitCode::from(EXIT_FAILURE)
        }
    };
    Ok(code)
}

fn cmd_plan(engine: &ReplayEngine<GitClient>, request: &ReplayRequest) -> Result<ExitCode> {
    let commits = engine.plan(request).context("failed to list commits")?;
    println!("{}", render::plan_line(request, commits.len()));
    if !commits.is_empty() {
        println!("{}", render::plan_table(&commits));
    }
    Ok(ExitCode::SUCCESS)
}

/// `RUST_LOG` wins; otherwise `-v` flags, otherwise the configured level.
fn init_tracing(verbose: u8, configured: &str) {
    let level = match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}
