//! Pipeline configuration.
//!
//! Everything the source workflow hardcoded (image name, registry namespace,
//! toolchain pin, branch filters) lives in an explicit [`PipelineConfig`]
//! passed into the runner at construction time. A `shipline.toml` file can
//! override any subset of it; every field has a default.

use crate::deps::DependencyManifest;
use crate::error::{ConfigError, Result};
use crate::trigger::TriggerRules;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Complete configuration for a pipeline runner
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct PipelineConfig {
    /// Name of the image to build and publish
    pub image_name: String,
    /// Registry namespace (user or organization) the image is published under
    pub registry_username: String,
    /// Artifact registry settings
    pub registry: RegistrySettings,
    /// Source repository settings
    pub repository: RepositorySettings,
    /// Branch filters for trigger events
    pub triggers: TriggerRules,
    /// Declared dependency manifest for the install step
    pub deps: DependencyManifest,
    /// Version computation policy
    pub versioning: VersioningPolicy,
    /// Per-step timeouts
    pub timeouts: StepTimeouts,
    /// Environment variable names the secrets are read from
    pub secrets: SecretVariables,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_name: "tis-devops-api".to_string(),
            registry_username: "abhishek976772".to_string(),
            registry: RegistrySettings::default(),
            repository: RepositorySettings::default(),
            triggers: TriggerRules::default(),
            deps: DependencyManifest::default(),
            versioning: VersioningPolicy::default(),
            timeouts: StepTimeouts::default(),
            secrets: SecretVariables::default(),
        }
    }
}

/// Artifact registry settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegistrySettings {
    /// Registry server passed to the container tool login.
    ///
    /// `None` means the container tool's default registry (Docker Hub).
    pub server: Option<String>,
    /// Base URL of the registry HTTP API used for the tag-existence probe
    pub api_base: String,
}

impl Default for RegistrySettings {
    fn default() -> Self {
        Self {
            server: None,
            api_base: "https://hub.docker.com".to_string(),
        }
    }
}

/// Source repository settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RepositorySettings {
    /// Clone URL, used when the working directory is not already a checkout
    pub url: Option<String>,
    /// Remote name used for fetch and push operations
    pub remote: String,
}

impl Default for RepositorySettings {
    fn default() -> Self {
        Self {
            url: None,
            remote: "origin".to_string(),
        }
    }
}

/// Policy for treating commit history with no conventional-commit messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UnparsablePolicy {
    /// Non-conforming commits carry no version bump; a history made entirely
    /// of them yields no release
    Ignore,
    /// A history with commits but no conforming ones fails the versioning step
    Fail,
}

/// Version computation policy
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VersioningPolicy {
    /// Prefix of release tags, e.g. `v` for `v1.2.3`
    pub tag_prefix: String,
    /// Version published when qualifying commits exist but no release tag does
    pub first_version: Version,
    /// Behavior on history without any conventional-commit messages
    pub on_unparsable: UnparsablePolicy,
    /// Changelog file updated on every published release
    pub changelog_path: PathBuf,
    /// Manifest file whose `version` key is rewritten on release, if any
    pub version_file: Option<PathBuf>,
    /// Whether to push the release commit and tag to the remote
    pub push_release: bool,
}

impl Default for VersioningPolicy {
    fn default() -> Self {
        Self {
            tag_prefix: "v".to_string(),
            first_version: Version::new(0, 1, 0),
            on_unparsable: UnparsablePolicy::Ignore,
            changelog_path: PathBuf::from("CHANGELOG.md"),
            version_file: None,
            push_release: true,
        }
    }
}

/// Per-step timeouts in seconds.
///
/// The source workflow declared none; each one is configuration here rather
/// than a hardcoded constant.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StepTimeouts {
    /// Source fetch timeout
    pub fetch: u64,
    /// Dependency installation timeout
    pub install: u64,
    /// Registry authentication timeout
    pub auth: u64,
    /// Version computation timeout (applies to each VCS invocation)
    pub versioning: u64,
    /// Image build timeout
    pub build: u64,
    /// Image push timeout
    pub push: u64,
}

impl Default for StepTimeouts {
    fn default() -> Self {
        Self {
            fetch: 300,
            install: 600,
            auth: 60,
            versioning: 120,
            build: 1800,
            push: 600,
        }
    }
}

/// Environment variable names the secrets are read from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SecretVariables {
    /// Variable holding the registry credential
    pub registry_token: String,
    /// Variable holding the VCS platform token
    pub vcs_token: String,
}

impl Default for SecretVariables {
    fn default() -> Self {
        Self {
            registry_token: "DOCKERHUB_TOKEN".to_string(),
            vcs_token: "GH_PAT".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from an optional path.
    ///
    /// With no explicit path, `shipline.toml` in the working directory is used
    /// when present, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>, workdir: &Path) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let implicit = workdir.join("shipline.toml");
                if implicit.exists() {
                    Self::load(&implicit)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Validate internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.image_name.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "image-name must not be empty".to_string(),
            }
            .into());
        }
        if self.registry_username.is_empty() {
            return Err(ConfigError::Invalid {
                reason: "registry-username must not be empty".to_string(),
            }
            .into());
        }
        if url::Url::parse(&self.registry.api_base).is_err() {
            return Err(ConfigError::Invalid {
                reason: format!("registry.api-base '{}' is not a valid URL", self.registry.api_base),
            }
            .into());
        }
        Ok(())
    }
}
