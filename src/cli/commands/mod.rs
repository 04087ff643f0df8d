//! Command execution coordinating the pipeline modules.

mod check;
mod preview;
mod run;

use crate::cli::args::{Args, Command};
use crate::cli::OutputManager;
use crate::error::Result;

use check::execute_check;
use preview::execute_preview;
use run::execute_run;

/// Execute the parsed command, returning the process exit code
pub async fn execute_command(args: Args) -> Result<i32> {
    if let Err(validation_error) = args.validate() {
        let output = OutputManager::new(false);
        output.error(&format!("Invalid arguments: {}", validation_error));
        return Ok(2);
    }

    let output = OutputManager::new(args.quiet);

    let result = match &args.command {
        Command::Run { .. } => execute_run(&args, &output).await,
        Command::Check => execute_check(&args, &output).await,
        Command::Preview => execute_preview(&args, &output).await.map(|()| 0),
    };

    match result {
        Ok(exit_code) => Ok(exit_code),
        Err(error) => {
            output.error(&format!("Command '{}' failed: {}", args.command.name(), error));

            let suggestions = error.recovery_suggestions();
            if !suggestions.is_empty() {
                output.println("\nRecovery suggestions:");
                for suggestion in suggestions {
                    output.indent(&suggestion);
                }
            }

            Ok(1)
        }
    }
}
