//! Command line interface for the pipeline runner.

pub mod args;
mod commands;
mod output;

pub use args::{Args, Command, EventKind};
pub use output::OutputManager;

use crate::error::Result;

/// Parse arguments and execute the selected command
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    commands::execute_command(args).await
}
