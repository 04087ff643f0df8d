//! The `preview` command: show the version decision without side effects.

use crate::cli::OutputManager;
use crate::cli::args::Args;
use crate::config::PipelineConfig;
use crate::error::Result;
use crate::vcs::{GitCli, VcsOperations};
use crate::version::{VersionCalculator, VersionDecision};

/// Compute and print the version decision for the current checkout
pub async fn execute_preview(args: &Args, output: &OutputManager) -> Result<()> {
    let config = PipelineConfig::load_or_default(args.config.as_deref(), &args.workdir)?;
    let vcs = GitCli::new(&args.workdir, &config.repository, config.timeouts);
    let calculator = VersionCalculator::new(config.versioning.clone())?;

    let last_tag = vcs.last_release_tag(&config.versioning.tag_prefix).await?;
    let commits = vcs
        .commits_since(last_tag.as_ref().map(|tag| tag.name.as_str()))
        .await?;

    match &last_tag {
        Some(tag) => output.info(&format!("last release: {}", tag.name)),
        None => output.info("no release tag found"),
    }
    output.info(&format!("commits since: {}", commits.len()));

    let decision = calculator.decide(last_tag.as_ref().map(|tag| &tag.version), &commits)?;

    match decision {
        VersionDecision::NoRelease => {
            output.println("no release-worthy changes; next run would publish nothing");
        }
        VersionDecision::Release { version, notes, .. } => {
            output.success(&format!("next version: {}", version));
            output.println(&format!(
                "next run would publish {}/{}:{}",
                config.registry_username, config.image_name, version
            ));
            for note in &notes {
                output.indent(&format!("{} ({})", note.description, note.short_hash));
            }
        }
    }

    Ok(())
}
