//! The `run` command: execute one pipeline run for a trigger event.

use crate::cli::args::{Args, Command, EventKind};
use crate::cli::OutputManager;
use crate::config::PipelineConfig;
use crate::deps::ManifestInstaller;
use crate::error::{CliError, Result};
use crate::registry::DockerCli;
use crate::runner::PipelineRunner;
use crate::secret::Secrets;
use crate::trigger::TriggerEvent;
use crate::vcs::GitCli;
use std::path::PathBuf;

/// Default report filename written into the workdir
const DEFAULT_REPORT_NAME: &str = "shipline-run.json";

/// Execute one pipeline run; returns the process exit code
pub async fn execute_run(args: &Args, output: &OutputManager) -> Result<i32> {
    let Command::Run {
        event,
        branch,
        source_branch,
        target_branch,
        dry_run,
        report,
    } = &args.command
    else {
        return Err(CliError::InvalidArguments {
            reason: "execute_run called without a run command".to_string(),
        }
        .into());
    };

    let config = PipelineConfig::load_or_default(args.config.as_deref(), &args.workdir)?;
    let trigger = build_trigger(*event, branch, source_branch, target_branch)?;

    // Secrets live exactly as long as this run
    let secrets = Secrets::from_env(&config.secrets.registry_token, &config.secrets.vcs_token)?;

    let vcs = GitCli::new(&args.workdir, &config.repository, config.timeouts);
    let installer = ManifestInstaller::new(config.deps.clone(), config.timeouts.install);
    let registry = DockerCli::new(&config.registry, config.timeouts)?;

    let runner = PipelineRunner::new(
        config,
        &args.workdir,
        vcs,
        installer,
        registry,
        output.clone(),
        *dry_run,
    );

    let outcome = runner.run(trigger, secrets).await?;

    if !outcome.ignored {
        let report_path: PathBuf = report
            .clone()
            .unwrap_or_else(|| args.workdir.join(DEFAULT_REPORT_NAME));
        outcome.record.save(&report_path)?;
        output.println(&outcome.record.summary());
    }

    Ok(outcome.exit_code())
}

/// Build the trigger event from the validated run arguments
fn build_trigger(
    event: EventKind,
    branch: &Option<String>,
    source_branch: &Option<String>,
    target_branch: &Option<String>,
) -> Result<TriggerEvent> {
    match event {
        EventKind::Push => {
            let branch = branch.clone().ok_or_else(|| CliError::InvalidArguments {
                reason: "--event push requires --branch".to_string(),
            })?;
            Ok(TriggerEvent::Push { branch })
        }
        EventKind::PullRequest => {
            let source_branch =
                source_branch
                    .clone()
                    .ok_or_else(|| CliError::InvalidArguments {
                        reason: "--event pull-request requires --source-branch".to_string(),
                    })?;
            let target_branch =
                target_branch
                    .clone()
                    .ok_or_else(|| CliError::InvalidArguments {
                        reason: "--event pull-request requires --target-branch".to_string(),
                    })?;
            Ok(TriggerEvent::PullRequest {
                source_branch,
                target_branch,
            })
        }
        EventKind::Dispatch => Ok(TriggerEvent::ManualDispatch),
    }
}
