//! Dependency manifest and installer for the install step.
//!
//! The manifest declares an exact toolchain pin and the packages later steps
//! need. Installation is a plain invocation of the declared installer command,
//! once per package, with no retry on failure.

use crate::error::{DependencyInstallError, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Trait defining the dependency installation the pipeline runner needs
pub trait DependencyInstaller {
    /// Verify the toolchain pin and install all declared packages, returning
    /// the number of packages installed
    fn install(&self, workdir: &Path) -> impl Future<Output = Result<usize>>;
}

/// Declared dependencies for a pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DependencyManifest {
    /// Toolchain pin
    pub toolchain: ToolchainSpec,
    /// Installer command the packages are handed to, argv-style
    pub installer: Vec<String>,
    /// Packages required by later steps
    #[serde(rename = "package")]
    pub packages: Vec<PackageSpec>,
}

impl Default for DependencyManifest {
    fn default() -> Self {
        Self {
            toolchain: ToolchainSpec::default(),
            installer: vec![
                "python3".to_string(),
                "-m".to_string(),
                "pip".to_string(),
                "install".to_string(),
            ],
            packages: vec![
                PackageSpec::unpinned("pytest"),
                PackageSpec::unpinned("pytest-asyncio"),
                PackageSpec::unpinned("python-semantic-release"),
            ],
        }
    }
}

/// Exact toolchain version pin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ToolchainSpec {
    /// Command used to invoke the toolchain
    pub command: String,
    /// Version the installed toolchain must report
    pub version: String,
}

impl Default for ToolchainSpec {
    fn default() -> Self {
        Self {
            command: "python3".to_string(),
            version: "3.10".to_string(),
        }
    }
}

/// A single declared package
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PackageSpec {
    /// Package name
    pub name: String,
    /// Exact version, if pinned
    #[serde(default)]
    pub version: Option<String>,
}

impl PackageSpec {
    /// A package with no version pin
    pub fn unpinned(name: &str) -> Self {
        Self {
            name: name.to_string(),
            version: None,
        }
    }

    /// The requirement string handed to the installer
    pub fn requirement(&self) -> String {
        match &self.version {
            Some(version) => format!("{}=={}", self.name, version),
            None => self.name.clone(),
        }
    }
}

/// Installs the declared dependencies into the fetched workspace.
///
/// Verifies the toolchain pin first, then installs each package in
/// declaration order. Any failure aborts the remaining installs.
pub struct ManifestInstaller {
    manifest: DependencyManifest,
    timeout_seconds: u64,
}

impl DependencyInstaller for ManifestInstaller {
    async fn install(&self, workdir: &Path) -> Result<usize> {
        self.verify_toolchain().await?;

        for package in &self.manifest.packages {
            self.install_package(workdir, package).await?;
        }

        Ok(self.manifest.packages.len())
    }
}

impl ManifestInstaller {
    /// Create an installer for the given manifest
    pub fn new(manifest: DependencyManifest, timeout_seconds: u64) -> Self {
        Self {
            manifest,
            timeout_seconds,
        }
    }

    /// Check that the pinned toolchain is present and reports the pinned version
    pub async fn verify_toolchain(&self) -> Result<()> {
        let spec = &self.manifest.toolchain;

        let output = timeout(
            Duration::from_secs(self.timeout_seconds),
            Command::new(&spec.command)
                .arg("--version")
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| DependencyInstallError::Timeout {
            seconds: self.timeout_seconds,
        })?
        .map_err(|e| DependencyInstallError::ToolchainUnavailable {
            command: spec.command.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(DependencyInstallError::ToolchainUnavailable {
                command: spec.command.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        // Toolchains print e.g. "Python 3.10.12"; the pin matches on prefix
        let reported = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let reported = if reported.is_empty() {
            String::from_utf8_lossy(&output.stderr).trim().to_string()
        } else {
            reported
        };

        if !toolchain_matches(&reported, &spec.version) {
            return Err(DependencyInstallError::ToolchainMismatch {
                expected: spec.version.clone(),
                found: reported,
            }
            .into());
        }

        log::debug!("toolchain ok: {}", reported);
        Ok(())
    }

    async fn install_package(&self, workdir: &Path, package: &PackageSpec) -> Result<()> {
        let argv = install_command(&self.manifest.installer, package);
        let (program, args) = match argv.split_first() {
            Some(split) => split,
            None => {
                return Err(DependencyInstallError::InstallFailed {
                    package: package.name.clone(),
                    reason: "installer command is empty".to_string(),
                }
                .into());
            }
        };

        log::info!("installing {}", package.requirement());

        let output = timeout(
            Duration::from_secs(self.timeout_seconds),
            Command::new(program)
                .args(args)
                .current_dir(workdir)
                .stdin(Stdio::null())
                .output(),
        )
        .await
        .map_err(|_| DependencyInstallError::Timeout {
            seconds: self.timeout_seconds,
        })?
        .map_err(|e| DependencyInstallError::InstallFailed {
            package: package.name.clone(),
            reason: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(DependencyInstallError::InstallFailed {
                package: package.name.clone(),
                reason: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            }
            .into());
        }

        Ok(())
    }
}

/// Build the argv for installing a single package
pub fn install_command(installer: &[String], package: &PackageSpec) -> Vec<String> {
    let mut argv: Vec<String> = installer.to_vec();
    argv.push(package.requirement());
    argv
}

/// Whether the version string a toolchain reports satisfies the pin.
///
/// The pin is a prefix at a component boundary: `3.10` accepts `Python 3.10.12`
/// but not `Python 3.1.0` or `Python 3.100.1`.
pub fn toolchain_matches(reported: &str, pin: &str) -> bool {
    reported.split_whitespace().any(|word| {
        word == pin
            || word
                .strip_prefix(pin)
                .is_some_and(|rest| rest.starts_with('.'))
    })
}
