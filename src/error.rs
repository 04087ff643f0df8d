//! Error types for pipeline operations.
//!
//! Every pipeline step has its own error enum; the top-level [`PipelineError`]
//! wraps them so a failed run can be reported as `Failed(step, reason)`.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Source fetch step errors
    #[error("Source fetch error: {0}")]
    SourceFetch(#[from] SourceFetchError),

    /// Dependency installation step errors
    #[error("Dependency install error: {0}")]
    DependencyInstall(#[from] DependencyInstallError),

    /// Registry authentication step errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Version computation step errors
    #[error("Versioning error: {0}")]
    Versioning(#[from] VersioningError),

    /// Image build errors
    #[error("Build error: {0}")]
    Build(#[from] BuildError),

    /// Image publish errors
    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    /// Run state tracking errors
    #[error("State error: {0}")]
    State(#[from] StateError),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// CLI argument errors
    #[error("CLI error: {0}")]
    Cli(#[from] CliError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Errors from the source fetch step
#[derive(Error, Debug)]
pub enum SourceFetchError {
    /// Working directory is not a git repository and no clone URL is configured
    #[error("'{path}' is not a git repository and no repository URL is configured")]
    NotARepository {
        /// Path that was inspected
        path: PathBuf,
    },

    /// Cloning the repository failed
    #[error("Failed to clone repository: {reason}")]
    CloneFailed {
        /// Reason for the failure
        reason: String,
    },

    /// The ref named by the trigger does not exist or cannot be fetched
    #[error("Ref '{ref_name}' is unavailable: {reason}")]
    RefUnavailable {
        /// Ref the trigger referenced
        ref_name: String,
        /// Reason for the failure
        reason: String,
    },

    /// The fetch step exceeded its configured timeout
    #[error("Source fetch timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },

    /// A git invocation failed in an unexpected way
    #[error("Git command failed: {reason}")]
    CommandFailed {
        /// Reason for the failure
        reason: String,
    },
}

/// Errors from the dependency installation step
#[derive(Error, Debug)]
pub enum DependencyInstallError {
    /// The pinned toolchain is not installed or not runnable
    #[error("Toolchain '{command}' is unavailable: {reason}")]
    ToolchainUnavailable {
        /// Toolchain command from the manifest
        command: String,
        /// Reason for the failure
        reason: String,
    },

    /// The installed toolchain does not match the pinned version
    #[error("Toolchain version mismatch: expected {expected}, found {found}")]
    ToolchainMismatch {
        /// Pinned version from the manifest
        expected: String,
        /// Version reported by the toolchain
        found: String,
    },

    /// Installing a declared package failed
    #[error("Failed to install package '{package}': {reason}")]
    InstallFailed {
        /// Package name
        package: String,
        /// Reason for the failure
        reason: String,
    },

    /// The install step exceeded its configured timeout
    #[error("Dependency installation timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },
}

/// Errors from the registry authentication step
#[derive(Error, Debug)]
pub enum AuthError {
    /// A required credential environment variable is unset
    #[error("Missing credential: environment variable '{variable}' is not set")]
    MissingCredential {
        /// Environment variable name
        variable: String,
    },

    /// The registry rejected the credentials
    #[error("Registry login failed for '{registry}': {reason}")]
    LoginFailed {
        /// Registry the login targeted
        registry: String,
        /// Reason for the failure (never contains the credential)
        reason: String,
    },

    /// The authentication step exceeded its configured timeout
    #[error("Registry authentication timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },
}

/// Errors from the version computation step
#[derive(Error, Debug)]
pub enum VersioningError {
    /// Commit history could not be read
    #[error("Cannot read commit history: {reason}")]
    HistoryUnavailable {
        /// Reason for the failure
        reason: String,
    },

    /// No commit since the last release parses as a conventional commit
    /// and the policy treats that as a hard failure
    #[error(
        "None of the {commits} commits since the last release follow the conventional-commit format"
    )]
    UnparsableHistory {
        /// Number of commits inspected
        commits: usize,
    },

    /// An existing release tag does not parse as a semantic version
    #[error("Release tag '{tag}' is not a valid semantic version: {source}")]
    InvalidTag {
        /// Tag name
        tag: String,
        /// Parsing error
        #[source]
        source: semver::Error,
    },

    /// The commit-header grammar failed to compile
    #[error("Invalid commit header pattern: {source}")]
    InvalidPattern {
        /// Regex compilation error
        #[source]
        source: regex::Error,
    },

    /// Writing the new version back to the project manifest failed
    #[error("Failed to write version to {path}: {reason}")]
    WriteBackFailed {
        /// Manifest path
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// Updating the changelog failed
    #[error("Failed to update changelog at {path}: {reason}")]
    ChangelogFailed {
        /// Changelog path
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// Creating the release commit failed
    #[error("Failed to create release commit: {reason}")]
    CommitFailed {
        /// Reason for the failure
        reason: String,
    },

    /// Creating the release tag failed
    #[error("Failed to create release tag '{tag}': {reason}")]
    TagCreationFailed {
        /// Tag name
        tag: String,
        /// Reason for the failure
        reason: String,
    },

    /// Pushing the release tag failed
    #[error("Failed to push release: {reason}")]
    PushFailed {
        /// Reason for the failure (never contains the VCS token)
        reason: String,
    },
}

/// Errors from the image build half of the publish step
#[derive(Error, Debug)]
pub enum BuildError {
    /// The container tool is not installed or the daemon is not running
    #[error("Container tool unavailable: {reason}")]
    DockerUnavailable {
        /// Reason for the failure
        reason: String,
    },

    /// The build context directory does not exist
    #[error("Build context not found at {path}")]
    ContextMissing {
        /// Expected context path
        path: PathBuf,
    },

    /// The image build failed
    #[error("Failed to build image '{image}': {reason}")]
    BuildFailed {
        /// Image reference
        image: String,
        /// Reason for the failure
        reason: String,
    },

    /// The build exceeded its configured timeout
    #[error("Image build timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },
}

/// Errors from the image push half of the publish step
#[derive(Error, Debug)]
pub enum PublishError {
    /// The target tag already exists in the registry
    #[error("Image tag '{image}' already exists in the registry")]
    TagExists {
        /// Image reference
        image: String,
    },

    /// Probing the registry for an existing tag failed
    #[error("Registry probe failed: {reason}")]
    RegistryProbeFailed {
        /// Reason for the failure
        reason: String,
    },

    /// Pushing the image failed; the locally built image is left in place
    #[error("Failed to push image '{image}': {reason}")]
    PushFailed {
        /// Image reference
        image: String,
        /// Reason for the failure
        reason: String,
    },

    /// The push exceeded its configured timeout
    #[error("Image push timed out after {seconds} seconds")]
    Timeout {
        /// Configured timeout in seconds
        seconds: u64,
    },
}

/// Run state tracking errors
#[derive(Error, Debug)]
pub enum StateError {
    /// A step attempted an illegal state transition
    #[error("Illegal run state transition: {from} -> {to}")]
    InvalidTransition {
        /// State the run was in
        from: String,
        /// State the transition targeted
        to: String,
    },

    /// Writing the run report failed
    #[error("Failed to save run report: {reason}")]
    SaveFailed {
        /// Reason for the failure
        reason: String,
    },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Reading the configuration file failed
    #[error("Failed to read config at {path}: {reason}")]
    ReadFailed {
        /// Configuration file path
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// Parsing the configuration file failed
    #[error("Failed to parse config at {path}: {reason}")]
    ParseFailed {
        /// Configuration file path
        path: PathBuf,
        /// Reason for the failure
        reason: String,
    },

    /// The configuration is internally inconsistent
    #[error("Invalid configuration: {reason}")]
    Invalid {
        /// Reason for the error
        reason: String,
    },
}

/// CLI-specific errors
#[derive(Error, Debug)]
pub enum CliError {
    /// Invalid command line arguments
    #[error("Invalid arguments: {reason}")]
    InvalidArguments {
        /// Reason for the error
        reason: String,
    },

    /// An external command failed
    #[error("Command execution failed: {command} - {reason}")]
    ExecutionFailed {
        /// Command that failed
        command: String,
        /// Reason for the failure
        reason: String,
    },
}

impl PipelineError {
    /// Name of the pipeline step this error belongs to, if any.
    ///
    /// Used to report failed runs as `Failed(step, reason)`.
    pub fn step_name(&self) -> Option<&'static str> {
        match self {
            PipelineError::SourceFetch(_) => Some("fetch-source"),
            PipelineError::DependencyInstall(_) => Some("install-dependencies"),
            PipelineError::Auth(_) => Some("authenticate"),
            PipelineError::Versioning(_) => Some("compute-version"),
            PipelineError::Build(_) | PipelineError::Publish(_) => Some("build-and-push"),
            _ => None,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            PipelineError::SourceFetch(SourceFetchError::NotARepository { .. }) => vec![
                "Run from within a git checkout, or set [repository] url in shipline.toml"
                    .to_string(),
            ],
            PipelineError::SourceFetch(SourceFetchError::RefUnavailable { ref_name, .. }) => vec![
                format!(
                    "Check that '{}' exists on the remote: git ls-remote origin",
                    ref_name
                ),
                "Fetch the remote manually: git fetch origin".to_string(),
            ],
            PipelineError::DependencyInstall(DependencyInstallError::ToolchainMismatch {
                expected,
                ..
            }) => vec![format!(
                "Install toolchain version {} or update the [deps.toolchain] pin",
                expected
            )],
            PipelineError::Auth(AuthError::MissingCredential { variable }) => vec![
                format!("Export the credential: export {}=<token>", variable),
                "Check [secrets] in shipline.toml for the expected variable names".to_string(),
            ],
            PipelineError::Auth(AuthError::LoginFailed { .. }) => vec![
                "Verify the token is valid and has push permissions".to_string(),
                "Check the registry server in [registry] configuration".to_string(),
            ],
            PipelineError::Versioning(VersioningError::UnparsableHistory { .. }) => vec![
                "Use conventional-commit messages (feat:, fix:, ...) for release-driving commits"
                    .to_string(),
                "Set versioning.on-unparsable = \"ignore\" to treat such history as no-release"
                    .to_string(),
            ],
            PipelineError::Publish(PublishError::TagExists { image }) => vec![
                format!(
                    "Tag {} was already published; existing tags are never overwritten",
                    image
                ),
                "If the previous run half-completed, bump with a new commit instead".to_string(),
            ],
            PipelineError::Build(BuildError::DockerUnavailable { .. }) => vec![
                "Ensure Docker is installed and the daemon is running: docker info".to_string(),
            ],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
