//! Version-control operations for the pipeline.
//!
//! This module defines the [`VcsOperations`] trait covering everything the
//! runner needs from the repository: fetching the triggering ref, reading
//! release tags and commit history, and recording a published release. The
//! production implementation is [`GitCli`], which drives the `git` executable.

mod git_cli;

pub use git_cli::GitCli;

use crate::error::Result;
use crate::secret::Credential;
use semver::Version;
use std::future::Future;
use std::path::PathBuf;

/// A fetched source checkout
#[derive(Debug, Clone)]
pub struct FetchInfo {
    /// Ref that was checked out, `HEAD` for manual dispatch
    pub ref_name: String,
    /// Commit hash of the checkout
    pub commit: String,
}

/// A single commit read from history
#[derive(Debug, Clone)]
pub struct CommitInfo {
    /// Full commit hash
    pub hash: String,
    /// Abbreviated hash for display
    pub short_hash: String,
    /// First line of the commit message
    pub summary: String,
    /// Remainder of the commit message
    pub body: String,
}

/// A release tag with its parsed version
#[derive(Debug, Clone)]
pub struct ReleaseTag {
    /// Tag name including prefix, e.g. `v1.2.0`
    pub name: String,
    /// Version the tag encodes
    pub version: Version,
}

/// Trait defining the VCS operations the pipeline runner needs
pub trait VcsOperations {
    /// Fetch the repository and check out the given ref.
    ///
    /// With `None`, the current `HEAD` is kept as-is (manual dispatch).
    fn fetch_source(&self, ref_name: Option<&str>) -> impl Future<Output = Result<FetchInfo>>;

    /// Find the highest release tag reachable from `HEAD`
    fn last_release_tag(
        &self,
        tag_prefix: &str,
    ) -> impl Future<Output = Result<Option<ReleaseTag>>>;

    /// Read commits after the given tag, oldest first.
    ///
    /// With `None`, the entire history of `HEAD` is read.
    fn commits_since(&self, tag: Option<&str>) -> impl Future<Output = Result<Vec<CommitInfo>>>;

    /// Stage and commit the release files (changelog, version write-back)
    fn commit_release_files(
        &self,
        paths: &[PathBuf],
        message: &str,
    ) -> impl Future<Output = Result<CommitInfo>>;

    /// Create an annotated release tag at `HEAD`
    fn create_version_tag(
        &self,
        tag_name: &str,
        message: &str,
    ) -> impl Future<Output = Result<()>>;

    /// Push the release commit and tag to the remote.
    ///
    /// When a token is given the push authenticates with it; the token never
    /// appears in logs or error messages.
    fn push_release(
        &self,
        branch: &str,
        token: Option<&Credential>,
    ) -> impl Future<Output = Result<()>>;
}
