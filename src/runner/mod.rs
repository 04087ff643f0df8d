//! The release pipeline runner.
//!
//! Executes the five steps of a run strictly in order, threading each step's
//! [`StepOutcome`] into the decision about the next one: a failure halts the
//! run, a skip is recorded and the run continues to its end. Version
//! computation and publishing only run for push triggers, and publishing only
//! when the version step reports a new release.

use crate::cli::OutputManager;
use crate::config::PipelineConfig;
use crate::deps::DependencyInstaller;
use crate::error::{PipelineError, PublishError, Result};
use crate::registry::{ImageRef, RegistryOperations};
use crate::secret::Secrets;
use crate::state::{RunRecord, RunState, StepRecord, StepStatus};
use crate::trigger::TriggerEvent;
use crate::vcs::VcsOperations;
use crate::version::{VersionCalculator, VersionDecision, changelog, update_manifest_version};
use semver::Version;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Step names as they appear in run records and failure reports
pub mod step {
    /// Source fetch step
    pub const FETCH: &str = "fetch-source";
    /// Dependency installation step
    pub const INSTALL: &str = "install-dependencies";
    /// Registry authentication step
    pub const AUTH: &str = "authenticate";
    /// Version computation step
    pub const VERSION: &str = "compute-version";
    /// Conditional build and push step
    pub const PUBLISH: &str = "build-and-push";
}

/// Result of one step, inspected by the runner to decide what happens next
#[derive(Debug)]
pub enum StepOutcome {
    /// The step ran and produced outputs for later steps
    Success(BTreeMap<String, String>),
    /// The step's precondition did not hold; the run continues
    Skip(String),
    /// The step failed; the run halts
    Failure(PipelineError),
}

/// A release the run published
#[derive(Debug, Clone)]
pub struct PublishedRelease {
    /// Version that was released
    pub version: Version,
    /// Image reference that was pushed
    pub image: ImageRef,
}

/// Result of a whole pipeline run
#[derive(Debug)]
pub struct PipelineOutcome {
    /// The run record, including per-step results
    pub record: RunRecord,
    /// The release, when one was published
    pub release: Option<PublishedRelease>,
    /// Whether the trigger was outside the configured rules and nothing ran
    pub ignored: bool,
}

impl PipelineOutcome {
    /// Whether the run finished without a step failure
    pub fn succeeded(&self) -> bool {
        self.record.failure().is_none()
    }

    /// Process exit code for this outcome
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }
}

/// The release pipeline runner.
///
/// Generic over its VCS, installer, and registry backends; production wiring
/// uses [`crate::vcs::GitCli`], [`crate::deps::ManifestInstaller`], and
/// [`crate::registry::DockerCli`].
pub struct PipelineRunner<V, D, R> {
    config: PipelineConfig,
    workdir: PathBuf,
    vcs: V,
    installer: D,
    registry: R,
    output: OutputManager,
    dry_run: bool,
}

impl<V: VcsOperations, D: DependencyInstaller, R: RegistryOperations> PipelineRunner<V, D, R> {
    /// Create a runner over the given backends
    pub fn new(
        config: PipelineConfig,
        workdir: &Path,
        vcs: V,
        installer: D,
        registry: R,
        output: OutputManager,
        dry_run: bool,
    ) -> Self {
        Self {
            config,
            workdir: workdir.to_path_buf(),
            vcs,
            installer,
            registry,
            output,
            dry_run,
        }
    }

    /// Execute one pipeline run for a trigger event.
    ///
    /// Secrets are consumed by this run only: the registry token crosses to
    /// the registry during the authentication step, the VCS token during the
    /// release push, and both are dropped with `secrets` when the run ends.
    pub async fn run(&self, trigger: TriggerEvent, secrets: Secrets) -> Result<PipelineOutcome> {
        if !self.config.triggers.covers(&trigger) {
            self.output.info(&format!(
                "ignoring {}: not covered by trigger rules",
                trigger.describe()
            ));
            return Ok(PipelineOutcome {
                record: RunRecord::new(trigger),
                release: None,
                ignored: true,
            });
        }

        self.output
            .info(&format!("starting run for {}", trigger.describe()));
        let mut record = RunRecord::new(trigger.clone());

        match self.run_steps(&mut record, &trigger, &secrets).await {
            Ok(release) => {
                record.advance(RunState::Done)?;
                match &release {
                    Some(release) => self
                        .output
                        .success(&format!("published {}", release.image)),
                    None => self.output.success("run finished, nothing published"),
                }
                Ok(PipelineOutcome {
                    record,
                    release,
                    ignored: false,
                })
            }
            Err(error) => {
                let step = error.step_name().unwrap_or("pipeline").to_string();
                self.output
                    .error(&format!("step '{}' failed: {}", step, error));
                record.advance(RunState::Failed {
                    step,
                    reason: error.to_string(),
                })?;
                Ok(PipelineOutcome {
                    record,
                    release: None,
                    ignored: false,
                })
            }
        }
    }

    /// Run the five steps, fail-fast, returning the published release if any
    async fn run_steps(
        &self,
        record: &mut RunRecord,
        trigger: &TriggerEvent,
        secrets: &Secrets,
    ) -> Result<Option<PublishedRelease>> {
        // Step 1: fetch source
        let started = chrono::Utc::now();
        let outcome = self.fetch_outcome(trigger).await;
        self.settle(record, step::FETCH, RunState::Fetched, None, outcome, started)?;

        // Step 2: install dependencies
        let started = chrono::Utc::now();
        let outcome = self.install_outcome().await;
        self.settle(
            record,
            step::INSTALL,
            RunState::DepsInstalled,
            None,
            outcome,
            started,
        )?;

        // Step 3: authenticate to the registry
        let started = chrono::Utc::now();
        let outcome = self.auth_outcome(secrets).await;
        self.settle(
            record,
            step::AUTH,
            RunState::Authenticated,
            None,
            outcome,
            started,
        )?;

        // Step 4: compute next version (push triggers only)
        let started = chrono::Utc::now();
        let (outcome, published_version) = match trigger {
            TriggerEvent::Push { branch } => self.versioning_outcome(branch, secrets).await,
            _ => (
                StepOutcome::Skip("versioning only runs for push events".to_string()),
                None,
            ),
        };
        self.settle(
            record,
            step::VERSION,
            RunState::VersionComputed,
            Some(RunState::Skipped),
            outcome,
            started,
        )?;

        // Step 5: build and push, only when step 4 published a new release
        let started = chrono::Utc::now();
        let (outcome, release) = match &published_version {
            Some(version) if self.dry_run => (
                StepOutcome::Skip(format!("dry run: would publish {}", version)),
                None,
            ),
            Some(version) => self.publish_outcome(version).await,
            None if trigger.is_push() => (
                StepOutcome::Skip("no new release published".to_string()),
                None,
            ),
            None => (
                StepOutcome::Skip("publishing only runs for push events".to_string()),
                None,
            ),
        };
        self.settle(
            record,
            step::PUBLISH,
            RunState::Published,
            Some(RunState::Skipped),
            outcome,
            started,
        )?;

        Ok(release)
    }

    /// Record a step outcome and move the state machine accordingly
    fn settle(
        &self,
        record: &mut RunRecord,
        name: &str,
        on_success: RunState,
        on_skip: Option<RunState>,
        outcome: StepOutcome,
        started_at: chrono::DateTime<chrono::Utc>,
    ) -> Result<()> {
        let finished_at = chrono::Utc::now();
        match outcome {
            StepOutcome::Success(outputs) => {
                self.output.success(name);
                record.record_step(StepRecord {
                    name: name.to_string(),
                    status: StepStatus::Succeeded,
                    outputs,
                    started_at,
                    finished_at,
                });
                record.advance(on_success)
            }
            StepOutcome::Skip(reason) => {
                self.output.info(&format!("{} skipped: {}", name, reason));
                record.record_step(StepRecord {
                    name: name.to_string(),
                    status: StepStatus::Skipped {
                        reason: reason.clone(),
                    },
                    outputs: BTreeMap::new(),
                    started_at,
                    finished_at,
                });
                match on_skip {
                    Some(state) if record.state != state => record.advance(state),
                    _ => Ok(()),
                }
            }
            StepOutcome::Failure(error) => {
                record.record_step(StepRecord {
                    name: name.to_string(),
                    status: StepStatus::Failed {
                        reason: error.to_string(),
                    },
                    outputs: BTreeMap::new(),
                    started_at,
                    finished_at,
                });
                Err(error)
            }
        }
    }

    async fn fetch_outcome(&self, trigger: &TriggerEvent) -> StepOutcome {
        self.output.progress("fetching source");
        match self.vcs.fetch_source(trigger.ref_name()).await {
            Ok(info) => {
                let mut outputs = BTreeMap::new();
                outputs.insert("ref".to_string(), info.ref_name);
                outputs.insert("commit".to_string(), info.commit);
                StepOutcome::Success(outputs)
            }
            Err(error) => StepOutcome::Failure(error),
        }
    }

    async fn install_outcome(&self) -> StepOutcome {
        self.output.progress("installing dependencies");
        match self.installer.install(&self.workdir).await {
            Ok(count) => {
                let mut outputs = BTreeMap::new();
                outputs.insert("packages_installed".to_string(), count.to_string());
                StepOutcome::Success(outputs)
            }
            Err(error) => StepOutcome::Failure(error),
        }
    }

    async fn auth_outcome(&self, secrets: &Secrets) -> StepOutcome {
        self.output.progress("authenticating to registry");
        match self
            .registry
            .login(&self.config.registry_username, &secrets.registry_token)
            .await
        {
            Ok(()) => {
                let mut outputs = BTreeMap::new();
                outputs.insert(
                    "username".to_string(),
                    self.config.registry_username.clone(),
                );
                StepOutcome::Success(outputs)
            }
            Err(error) => StepOutcome::Failure(error),
        }
    }

    async fn versioning_outcome(
        &self,
        branch: &str,
        secrets: &Secrets,
    ) -> (StepOutcome, Option<Version>) {
        self.output.progress("computing next version");
        match self.compute_and_release(branch, secrets).await {
            Ok((outputs, version)) => (StepOutcome::Success(outputs), version),
            Err(error) => (StepOutcome::Failure(error), None),
        }
    }

    async fn compute_and_release(
        &self,
        branch: &str,
        secrets: &Secrets,
    ) -> Result<(BTreeMap<String, String>, Option<Version>)> {
        let calculator = VersionCalculator::new(self.config.versioning.clone())?;

        let last_tag = self
            .vcs
            .last_release_tag(&self.config.versioning.tag_prefix)
            .await?;
        let commits = self
            .vcs
            .commits_since(last_tag.as_ref().map(|tag| tag.name.as_str()))
            .await?;
        let decision =
            calculator.decide(last_tag.as_ref().map(|tag| &tag.version), &commits)?;

        let mut outputs = BTreeMap::new();
        if let Some(tag) = &last_tag {
            outputs.insert("last_release".to_string(), tag.name.clone());
        }

        match decision {
            VersionDecision::NoRelease => {
                outputs.insert("new_release_published".to_string(), "false".to_string());
                self.output.info("no release-worthy changes found");
                Ok((outputs, None))
            }
            VersionDecision::Release { version, notes, .. } => {
                outputs.insert("new_release_published".to_string(), "true".to_string());
                outputs.insert("new_release_version".to_string(), version.to_string());

                if self.dry_run {
                    self.output
                        .info(&format!("dry run: next version is {}", version));
                } else {
                    self.record_release(branch, secrets, &version, &notes, &calculator)
                        .await?;
                }

                Ok((outputs, Some(version)))
            }
        }
    }

    /// Side effects of a published decision: changelog, write-back, tag, push
    async fn record_release(
        &self,
        branch: &str,
        secrets: &Secrets,
        version: &Version,
        notes: &[crate::version::ReleaseNote],
        calculator: &VersionCalculator,
    ) -> Result<()> {
        let policy = &self.config.versioning;
        let mut release_files = Vec::new();

        if let Some(version_file) = &policy.version_file {
            update_manifest_version(&self.workdir.join(version_file), version)?;
            release_files.push(version_file.clone());
        }

        let entry = changelog::render_entry(version, chrono::Utc::now().date_naive(), notes);
        changelog::prepend_entry(&self.workdir.join(&policy.changelog_path), &entry)?;
        release_files.push(policy.changelog_path.clone());

        self.vcs
            .commit_release_files(&release_files, &format!("chore(release): {}", version))
            .await?;
        self.vcs
            .create_version_tag(&calculator.tag_name(version), &format!("Release {}", version))
            .await?;

        if policy.push_release {
            self.vcs
                .push_release(branch, secrets.vcs_token.as_ref())
                .await?;
        }

        Ok(())
    }

    async fn publish_outcome(
        &self,
        version: &Version,
    ) -> (StepOutcome, Option<PublishedRelease>) {
        let image = ImageRef::for_release(
            &self.config.registry_username,
            &self.config.image_name,
            version,
        );
        self.output.progress(&format!("building and pushing {}", image));

        match self.build_and_push(&image).await {
            Ok(outputs) => (
                StepOutcome::Success(outputs),
                Some(PublishedRelease {
                    version: version.clone(),
                    image,
                }),
            ),
            Err(error) => (StepOutcome::Failure(error), None),
        }
    }

    async fn build_and_push(&self, image: &ImageRef) -> Result<BTreeMap<String, String>> {
        if self.registry.tag_exists(image).await? {
            return Err(PublishError::TagExists {
                image: image.to_string(),
            }
            .into());
        }

        self.registry.build_image(&self.workdir, image).await?;
        // A failed push leaves the locally built image in place; there is no
        // cleanup to run here.
        self.registry.push_image(image).await?;

        let mut outputs = BTreeMap::new();
        outputs.insert("image".to_string(), image.to_string());
        Ok(outputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::secret::{Credential, Secrets};
    use crate::vcs::{CommitInfo, FetchInfo, ReleaseTag};
    use std::sync::Mutex;

    struct FakeVcs {
        last_tag: Option<ReleaseTag>,
        commits: Vec<CommitInfo>,
        history_reads: Mutex<usize>,
        release_commits: Mutex<Vec<String>>,
        tags_created: Mutex<Vec<String>>,
        pushes: Mutex<usize>,
    }

    impl FakeVcs {
        fn new(last_tag: Option<(&str, Version)>, summaries: &[&str]) -> Self {
            Self {
                last_tag: last_tag.map(|(name, version)| ReleaseTag {
                    name: name.to_string(),
                    version,
                }),
                commits: summaries
                    .iter()
                    .map(|summary| CommitInfo {
                        hash: "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa".to_string(),
                        short_hash: "aaaaaaa".to_string(),
                        summary: summary.to_string(),
                        body: String::new(),
                    })
                    .collect(),
                history_reads: Mutex::new(0),
                release_commits: Mutex::new(Vec::new()),
                tags_created: Mutex::new(Vec::new()),
                pushes: Mutex::new(0),
            }
        }

        fn history_reads(&self) -> usize {
            *self.history_reads.lock().unwrap()
        }

        fn tags_created(&self) -> Vec<String> {
            self.tags_created.lock().unwrap().clone()
        }

        fn pushes(&self) -> usize {
            *self.pushes.lock().unwrap()
        }
    }

    impl VcsOperations for &FakeVcs {
        async fn fetch_source(&self, ref_name: Option<&str>) -> Result<FetchInfo> {
            Ok(FetchInfo {
                ref_name: ref_name.unwrap_or("HEAD").to_string(),
                commit: "c0ffee0".to_string(),
            })
        }

        async fn last_release_tag(&self, _tag_prefix: &str) -> Result<Option<ReleaseTag>> {
            *self.history_reads.lock().unwrap() += 1;
            Ok(self.last_tag.clone())
        }

        async fn commits_since(&self, _tag: Option<&str>) -> Result<Vec<CommitInfo>> {
            Ok(self.commits.clone())
        }

        async fn commit_release_files(
            &self,
            _paths: &[PathBuf],
            message: &str,
        ) -> Result<CommitInfo> {
            self.release_commits.lock().unwrap().push(message.to_string());
            Ok(CommitInfo {
                hash: "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb".to_string(),
                short_hash: "bbbbbbb".to_string(),
                summary: message.to_string(),
                body: String::new(),
            })
        }

        async fn create_version_tag(&self, tag_name: &str, _message: &str) -> Result<()> {
            self.tags_created.lock().unwrap().push(tag_name.to_string());
            Ok(())
        }

        async fn push_release(&self, _branch: &str, _token: Option<&Credential>) -> Result<()> {
            *self.pushes.lock().unwrap() += 1;
            Ok(())
        }
    }

    struct FakeInstaller;

    impl DependencyInstaller for FakeInstaller {
        async fn install(&self, _workdir: &Path) -> Result<usize> {
            Ok(3)
        }
    }

    struct FakeRegistry {
        login_ok: bool,
        existing_tags: Vec<String>,
        logins: Mutex<usize>,
        builds: Mutex<Vec<String>>,
        pushes: Mutex<Vec<String>>,
    }

    impl FakeRegistry {
        fn new() -> Self {
            Self {
                login_ok: true,
                existing_tags: Vec::new(),
                logins: Mutex::new(0),
                builds: Mutex::new(Vec::new()),
                pushes: Mutex::new(Vec::new()),
            }
        }

        fn rejecting_logins() -> Self {
            Self {
                login_ok: false,
                ..Self::new()
            }
        }

        fn with_existing_tag(tag: &str) -> Self {
            Self {
                existing_tags: vec![tag.to_string()],
                ..Self::new()
            }
        }

        fn builds(&self) -> Vec<String> {
            self.builds.lock().unwrap().clone()
        }

        fn pushes(&self) -> Vec<String> {
            self.pushes.lock().unwrap().clone()
        }
    }

    impl RegistryOperations for &FakeRegistry {
        async fn login(&self, _username: &str, _token: &Credential) -> Result<()> {
            *self.logins.lock().unwrap() += 1;
            if self.login_ok {
                Ok(())
            } else {
                Err(AuthError::LoginFailed {
                    registry: "docker.io".to_string(),
                    reason: "incorrect username or password".to_string(),
                }
                .into())
            }
        }

        async fn tag_exists(&self, image: &ImageRef) -> Result<bool> {
            Ok(self.existing_tags.contains(&image.to_string()))
        }

        async fn build_image(&self, _context: &Path, image: &ImageRef) -> Result<()> {
            self.builds.lock().unwrap().push(image.to_string());
            Ok(())
        }

        async fn push_image(&self, image: &ImageRef) -> Result<()> {
            self.pushes.lock().unwrap().push(image.to_string());
            Ok(())
        }
    }

    fn secrets() -> Secrets {
        Secrets {
            registry_token: Credential::new("registry-token"),
            vcs_token: Some(Credential::new("vcs-token")),
        }
    }

    fn runner<'a>(
        vcs: &'a FakeVcs,
        registry: &'a FakeRegistry,
        workdir: &Path,
        dry_run: bool,
    ) -> PipelineRunner<&'a FakeVcs, FakeInstaller, &'a FakeRegistry> {
        PipelineRunner::new(
            PipelineConfig::default(),
            workdir,
            vcs,
            FakeInstaller,
            registry,
            OutputManager::new(true),
            dry_run,
        )
    }

    fn push(branch: &str) -> TriggerEvent {
        TriggerEvent::Push {
            branch: branch.to_string(),
        }
    }

    fn step_status<'a>(record: &'a RunRecord, name: &str) -> &'a StepStatus {
        &record
            .steps
            .iter()
            .find(|step| step.name == name)
            .unwrap_or_else(|| panic!("step {} not recorded", name))
            .status
    }

    #[tokio::test]
    async fn test_pull_request_never_versions_or_publishes() {
        let vcs = FakeVcs::new(Some(("v1.2.0", Version::new(1, 2, 0))), &["fix: panic"]);
        let registry = FakeRegistry::new();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let trigger = TriggerEvent::PullRequest {
            source_branch: "feature/login".to_string(),
            target_branch: "beta".to_string(),
        };
        let outcome = runner.run(trigger, secrets()).await.unwrap();

        assert!(outcome.succeeded());
        assert!(outcome.release.is_none());
        assert_eq!(outcome.record.state, RunState::Done);
        assert!(step_status(&outcome.record, step::FETCH).is_success());
        assert!(step_status(&outcome.record, step::INSTALL).is_success());
        assert!(step_status(&outcome.record, step::AUTH).is_success());
        assert!(step_status(&outcome.record, step::VERSION).is_skipped());
        assert!(step_status(&outcome.record, step::PUBLISH).is_skipped());
        // no side effects at all
        assert_eq!(vcs.history_reads(), 0);
        assert!(vcs.tags_created().is_empty());
        assert!(registry.builds().is_empty());
        assert!(registry.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_manual_dispatch_runs_validation_steps_only() {
        let vcs = FakeVcs::new(None, &["feat: x"]);
        let registry = FakeRegistry::new();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let outcome = runner.run(TriggerEvent::ManualDispatch, secrets()).await.unwrap();

        assert!(outcome.succeeded());
        assert!(step_status(&outcome.record, step::VERSION).is_skipped());
        assert!(step_status(&outcome.record, step::PUBLISH).is_skipped());
        assert!(registry.builds().is_empty());
    }

    #[tokio::test]
    async fn test_push_with_fix_publishes_patch_release() {
        let vcs = FakeVcs::new(
            Some(("v1.2.0", Version::new(1, 2, 0))),
            &["fix: resolve handler panic"],
        );
        let registry = FakeRegistry::new();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let outcome = runner.run(push("main"), secrets()).await.unwrap();

        assert!(outcome.succeeded());
        let release = outcome.release.as_ref().unwrap();
        assert_eq!(release.version, Version::new(1, 2, 1));
        assert_eq!(
            release.image.to_string(),
            "abhishek976772/tis-devops-api:1.2.1"
        );
        // exactly one image pushed, tagged with exactly the new version
        assert_eq!(
            registry.pushes(),
            vec!["abhishek976772/tis-devops-api:1.2.1".to_string()]
        );
        assert_eq!(vcs.tags_created(), vec!["v1.2.1".to_string()]);
        assert_eq!(vcs.pushes(), 1);
        // the version step's outputs are readable by later consumers
        let outputs = outcome.record.outputs_of(step::VERSION).unwrap();
        assert_eq!(outputs.get("new_release_published").unwrap(), "true");
        assert_eq!(outputs.get("new_release_version").unwrap(), "1.2.1");
        // changelog side effect landed in the workspace
        assert!(workdir.path().join("CHANGELOG.md").exists());
    }

    #[tokio::test]
    async fn test_push_without_qualifying_commits_skips_publish() {
        let vcs = FakeVcs::new(
            Some(("v1.2.0", Version::new(1, 2, 0))),
            &["chore: bump dev deps"],
        );
        let registry = FakeRegistry::new();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let outcome = runner.run(push("main"), secrets()).await.unwrap();

        assert!(outcome.succeeded());
        assert!(outcome.release.is_none());
        assert!(step_status(&outcome.record, step::VERSION).is_success());
        assert!(step_status(&outcome.record, step::PUBLISH).is_skipped());
        let outputs = outcome.record.outputs_of(step::VERSION).unwrap();
        assert_eq!(outputs.get("new_release_published").unwrap(), "false");
        assert!(registry.builds().is_empty());
        assert!(vcs.tags_created().is_empty());
    }

    #[tokio::test]
    async fn test_rerun_on_unchanged_history_publishes_nothing() {
        // After a release, the tag points at HEAD and no commits follow it
        let vcs = FakeVcs::new(Some(("v1.2.1", Version::new(1, 2, 1))), &[]);
        let registry = FakeRegistry::new();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let outcome = runner.run(push("main"), secrets()).await.unwrap();

        assert!(outcome.succeeded());
        assert!(outcome.release.is_none());
        assert!(registry.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_halts_run_before_versioning() {
        let vcs = FakeVcs::new(Some(("v1.2.0", Version::new(1, 2, 0))), &["fix: panic"]);
        let registry = FakeRegistry::rejecting_logins();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let outcome = runner.run(push("main"), secrets()).await.unwrap();

        assert!(!outcome.succeeded());
        assert_eq!(outcome.exit_code(), 1);
        let (step, _reason) = outcome.record.failure().unwrap();
        assert_eq!(step, step::AUTH);
        // steps 4 and 5 never execute, not even as skips
        assert_eq!(outcome.record.steps.len(), 3);
        assert_eq!(vcs.history_reads(), 0);
        assert!(registry.builds().is_empty());
    }

    #[tokio::test]
    async fn test_existing_registry_tag_fails_publish_without_overwrite() {
        let vcs = FakeVcs::new(
            Some(("v1.2.0", Version::new(1, 2, 0))),
            &["fix: resolve handler panic"],
        );
        let registry = FakeRegistry::with_existing_tag("abhishek976772/tis-devops-api:1.2.1");
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let outcome = runner.run(push("main"), secrets()).await.unwrap();

        assert!(!outcome.succeeded());
        let (step, reason) = outcome.record.failure().unwrap();
        assert_eq!(step, step::PUBLISH);
        assert!(reason.contains("already exists"));
        assert!(registry.builds().is_empty());
        assert!(registry.pushes().is_empty());
    }

    #[tokio::test]
    async fn test_uncovered_trigger_is_ignored() {
        let vcs = FakeVcs::new(None, &[]);
        let registry = FakeRegistry::new();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), false);

        let outcome = runner.run(push("feature/login"), secrets()).await.unwrap();

        assert!(outcome.ignored);
        assert!(outcome.record.steps.is_empty());
        assert_eq!(outcome.exit_code(), 0);
    }

    #[tokio::test]
    async fn test_dry_run_computes_version_without_side_effects() {
        let vcs = FakeVcs::new(
            Some(("v1.2.0", Version::new(1, 2, 0))),
            &["feat: add report export"],
        );
        let registry = FakeRegistry::new();
        let workdir = tempfile::tempdir().unwrap();
        let runner = runner(&vcs, &registry, workdir.path(), true);

        let outcome = runner.run(push("main"), secrets()).await.unwrap();

        assert!(outcome.succeeded());
        assert!(outcome.release.is_none());
        let outputs = outcome.record.outputs_of(step::VERSION).unwrap();
        assert_eq!(outputs.get("new_release_version").unwrap(), "1.3.0");
        assert!(step_status(&outcome.record, step::PUBLISH).is_skipped());
        assert!(vcs.tags_created().is_empty());
        assert_eq!(vcs.pushes(), 0);
        assert!(registry.builds().is_empty());
        assert!(!workdir.path().join("CHANGELOG.md").exists());
    }
}
