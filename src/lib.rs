//! # shipline
//!
//! A conditional, versioned build-and-publish pipeline runner.
//!
//! Given a trigger event (push, pull request, or manual dispatch), shipline
//! executes one pipeline run: fetch source, install the declared
//! dependencies, authenticate to the artifact registry, compute the next
//! semantic version from conventional-commit history, and conditionally
//! build and push a container image tagged with that version.
//!
//! ## Behavior
//!
//! - **Fail-fast**: any step failure halts the run; nothing is retried.
//! - **Skip is not failure**: pull-request and dispatch runs execute the
//!   validation steps and skip versioning and publishing; a push with no
//!   release-worthy commits skips publishing. Both finish successfully.
//! - **Deterministic versioning**: the version is derived from the commits
//!   since the last release tag, so re-running on unchanged history publishes
//!   nothing and published versions only ever increase.
//! - **Scoped secrets**: credentials are read from the environment into
//!   redacted wrappers and survive only for the run that consumed them.
//!
//! ## Usage
//!
//! ```bash
//! shipline run --event push --branch main
//! shipline run --event pull-request --source-branch feat/x --target-branch beta
//! shipline preview       # version decision only, no side effects
//! shipline check         # verify tools, config, and credentials
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod cli;
pub mod config;
pub mod deps;
pub mod error;
pub mod registry;
pub mod runner;
pub mod secret;
pub mod state;
pub mod trigger;
pub mod vcs;
pub mod version;

// Re-export main types for public API
pub use cli::Args;
pub use config::{PipelineConfig, StepTimeouts, UnparsablePolicy, VersioningPolicy};
pub use error::{PipelineError, Result};
pub use registry::{DockerCli, ImageRef, RegistryOperations};
pub use runner::{PipelineOutcome, PipelineRunner, PublishedRelease, StepOutcome};
pub use secret::{Credential, Secrets};
pub use state::{RunRecord, RunState, StepRecord, StepStatus};
pub use trigger::{TriggerEvent, TriggerRules};
pub use vcs::{GitCli, VcsOperations};
pub use version::{VersionCalculator, VersionDecision};
