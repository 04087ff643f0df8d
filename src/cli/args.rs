//! Command line argument parsing and validation.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Conditional, versioned build-and-publish pipeline runner
#[derive(Parser, Debug)]
#[command(
    name = "shipline",
    version,
    about = "Conditional, versioned build-and-publish pipeline runner",
    long_about = "Runs the release pipeline for one trigger event: fetch source, install \
declared dependencies, authenticate to the artifact registry, compute the next semantic \
version from conventional-commit history, and conditionally build and push a container \
image tagged with that version.

Usage:
  shipline run --event push --branch main
  shipline run --event pull-request --source-branch feat/x --target-branch beta
  shipline preview"
)]
pub struct Args {
    /// Path to the configuration file (default: shipline.toml in the workdir)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Working directory holding (or receiving) the source checkout
    #[arg(long, global = true, default_value = ".", value_name = "DIR")]
    pub workdir: PathBuf,

    /// Suppress non-error output
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Kind of trigger event handed to `run`
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// A push to a branch
    Push,
    /// A pull request
    PullRequest,
    /// A manual invocation with no parameters
    Dispatch,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute one pipeline run for a trigger event
    Run {
        /// Kind of event that triggered the run
        #[arg(long, value_enum)]
        event: EventKind,

        /// Branch that received the push (push events)
        #[arg(long, value_name = "BRANCH")]
        branch: Option<String>,

        /// Branch the pull request comes from (pull-request events)
        #[arg(long, value_name = "BRANCH")]
        source_branch: Option<String>,

        /// Branch the pull request targets (pull-request events)
        #[arg(long, value_name = "BRANCH")]
        target_branch: Option<String>,

        /// Compute everything, publish nothing
        #[arg(long)]
        dry_run: bool,

        /// Where to write the JSON run report (default: shipline-run.json in the workdir)
        #[arg(long, value_name = "PATH")]
        report: Option<PathBuf>,
    },

    /// Compute the version decision for the current checkout, with no side effects
    Preview,

    /// Verify required tools, configuration, and credentials are in place
    Check,
}

impl Command {
    /// Command name for messages
    pub fn name(&self) -> &'static str {
        match self {
            Command::Run { .. } => "run",
            Command::Preview => "preview",
            Command::Check => "check",
        }
    }
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if let Command::Run {
            event,
            branch,
            source_branch,
            target_branch,
            ..
        } = &self.command
        {
            match event {
                EventKind::Push if branch.is_none() => {
                    return Err("--event push requires --branch".to_string());
                }
                EventKind::PullRequest
                    if source_branch.is_none() || target_branch.is_none() =>
                {
                    return Err(
                        "--event pull-request requires --source-branch and --target-branch"
                            .to_string(),
                    );
                }
                EventKind::Dispatch
                    if branch.is_some() || source_branch.is_some() || target_branch.is_some() =>
                {
                    return Err("--event dispatch takes no branch arguments".to_string());
                }
                _ => {}
            }
        }
        Ok(())
    }
}
