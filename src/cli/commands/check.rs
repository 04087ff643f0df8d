//! The `check` command: verify the environment can run the pipeline.

use crate::cli::OutputManager;
use crate::cli::args::Args;
use crate::config::PipelineConfig;
use crate::error::{CliError, Result};

/// Verify tools, configuration, and credential variables; returns the exit code
pub async fn execute_check(args: &Args, output: &OutputManager) -> Result<i32> {
    let mut problems: Vec<String> = Vec::new();

    // Required executables
    for tool in ["git", "docker"] {
        match which::which(tool) {
            Ok(path) => output.success(&format!("{} found at {}", tool, path.display())),
            Err(_) => problems.push(format!("'{}' not found on PATH", tool)),
        }
    }

    // Configuration loads and validates
    let config = match PipelineConfig::load_or_default(args.config.as_deref(), &args.workdir) {
        Ok(config) => {
            output.success(&format!(
                "configuration ok ({}/{})",
                config.registry_username, config.image_name
            ));
            Some(config)
        }
        Err(error) => {
            problems.push(format!("configuration: {}", error));
            None
        }
    };

    // Credential variables are present (values are never read here)
    if let Some(config) = &config {
        for (label, variable, required) in [
            ("registry token", config.secrets.registry_token.as_str(), true),
            ("VCS token", config.secrets.vcs_token.as_str(), false),
        ] {
            match std::env::var_os(variable) {
                Some(value) if !value.is_empty() => {
                    output.success(&format!("{} variable {} is set", label, variable));
                }
                _ if required => {
                    problems.push(format!("{} variable {} is not set", label, variable));
                }
                _ => {
                    output.warn(&format!(
                        "{} variable {} is not set; release pushes will be unauthenticated",
                        label, variable
                    ));
                }
            }
        }
    }

    if problems.is_empty() {
        output.success("environment is ready");
        Ok(0)
    } else {
        for problem in &problems {
            output.error(problem);
        }
        Err(CliError::InvalidArguments {
            reason: format!("{} problem(s) found", problems.len()),
        }
        .into())
    }
}
