//! Artifact registry operations.
//!
//! [`RegistryOperations`] covers the registry-facing half of the pipeline:
//! authentication, the tag-existence probe, and the image build and push. The
//! production implementation is [`DockerCli`], which drives the `docker`
//! executable and the registry HTTP API.

mod docker_cli;

pub use docker_cli::DockerCli;

use crate::error::Result;
use crate::secret::Credential;
use semver::Version;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;

/// A fully qualified image reference, `namespace/name:tag`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    /// Registry namespace (user or organization)
    pub namespace: String,
    /// Image name
    pub name: String,
    /// Image tag
    pub tag: String,
}

impl ImageRef {
    /// Reference for a released version, tagged with the bare version number
    pub fn for_release(namespace: &str, name: &str, version: &Version) -> Self {
        Self {
            namespace: namespace.to_string(),
            name: name.to_string(),
            tag: version.to_string(),
        }
    }

    /// The `namespace/name` repository part of the reference
    pub fn repository(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl std::fmt::Display for ImageRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}:{}", self.namespace, self.name, self.tag)
    }
}

/// Trait defining the registry operations the pipeline runner needs
pub trait RegistryOperations {
    /// Authenticate against the registry.
    ///
    /// The credential goes to the container tool over stdin and is not
    /// retained afterwards.
    fn login(&self, username: &str, token: &Credential) -> impl Future<Output = Result<()>>;

    /// Whether the given tag already exists in the registry
    fn tag_exists(&self, image: &ImageRef) -> impl Future<Output = Result<bool>>;

    /// Build the image from the given context directory
    fn build_image(&self, context: &Path, image: &ImageRef) -> impl Future<Output = Result<()>>;

    /// Push the built image to the registry
    fn push_image(&self, image: &ImageRef) -> impl Future<Output = Result<()>>;
}
