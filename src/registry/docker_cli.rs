//! Docker implementation of [`RegistryOperations`].
//!
//! Builds and pushes go through the `docker` executable with streamed output
//! and configurable timeouts; the tag-existence probe goes through the
//! registry HTTP API.

use crate::config::{RegistrySettings, StepTimeouts};
use crate::error::{AuthError, BuildError, ConfigError, PublishError, Result};
use crate::registry::{ImageRef, RegistryOperations};
use crate::secret::Credential;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::time::timeout;
use url::Url;

/// Timeout for the daemon availability check; a quick probe, not a build
const DOCKER_INFO_TIMEOUT: Duration = Duration::from_secs(5);

/// Registry operations using the `docker` command-line tool
#[derive(Debug)]
pub struct DockerCli {
    server: Option<String>,
    api_base: Url,
    http: reqwest::Client,
    timeouts: StepTimeouts,
}

impl DockerCli {
    /// Create a registry backend from the configured settings
    pub fn new(registry: &RegistrySettings, timeouts: StepTimeouts) -> Result<Self> {
        let api_base = Url::parse(&registry.api_base).map_err(|e| ConfigError::Invalid {
            reason: format!("registry.api-base '{}': {}", registry.api_base, e),
        })?;

        Ok(Self {
            server: registry.server.clone(),
            api_base,
            http: reqwest::Client::new(),
            timeouts,
        })
    }

    /// Check that the docker daemon is reachable
    pub async fn ensure_available(&self) -> Result<()> {
        let status = timeout(
            DOCKER_INFO_TIMEOUT,
            Command::new("docker")
                .arg("info")
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status(),
        )
        .await
        .map_err(|_| BuildError::DockerUnavailable {
            reason: format!(
                "daemon check timed out after {} seconds",
                DOCKER_INFO_TIMEOUT.as_secs()
            ),
        })?
        .map_err(|e| BuildError::DockerUnavailable {
            reason: format!("docker command not found: {}", e),
        })?;

        if !status.success() {
            return Err(BuildError::DockerUnavailable {
                reason: format!(
                    "daemon is not responding (exit code {})",
                    status.code().unwrap_or(-1)
                ),
            }
            .into());
        }

        Ok(())
    }

    fn registry_name(&self) -> String {
        self.server
            .clone()
            .unwrap_or_else(|| "docker.io".to_string())
    }

    /// URL of the tag-existence endpoint for an image
    fn tag_url(&self, image: &ImageRef) -> Result<Url> {
        self.api_base
            .join(&format!(
                "v2/repositories/{}/{}/tags/{}",
                image.namespace, image.name, image.tag
            ))
            .map_err(|e| {
                PublishError::RegistryProbeFailed {
                    reason: e.to_string(),
                }
                .into()
            })
    }

    /// Spawn a docker subcommand, stream its stdout, and enforce a timeout.
    ///
    /// On timeout the child is killed and reaped before the error is returned.
    async fn run_streamed(
        &self,
        args: &[&str],
        context: Option<&Path>,
        timeout_seconds: u64,
    ) -> std::result::Result<(), DockerFailure> {
        let mut command = Command::new("docker");
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(context) = context {
            command.current_dir(context);
        }

        let mut child = command
            .spawn()
            .map_err(|e| DockerFailure::Spawn(e.to_string()))?;

        let stdout = child.stdout.take();
        // stderr drains on its own task so a full pipe can never stall the child
        let stderr_task = child.stderr.take().map(|stderr| {
            tokio::spawn(async move {
                let mut collected = String::new();
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::debug!("docker: {}", line);
                    collected.push_str(&line);
                    collected.push('\n');
                }
                collected
            })
        });

        let wait_result = timeout(Duration::from_secs(timeout_seconds), async {
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    log::debug!("docker: {}", line);
                }
            }
            child.wait().await
        })
        .await;

        let status = match wait_result {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(DockerFailure::Spawn(e.to_string())),
            Err(_) => {
                if let Err(e) = child.kill().await {
                    log::warn!("failed to kill timed-out docker process: {}", e);
                }
                let _ = timeout(Duration::from_secs(10), child.wait()).await;
                return Err(DockerFailure::Timeout {
                    seconds: timeout_seconds,
                });
            }
        };

        let stderr_output = match stderr_task {
            Some(task) => task.await.unwrap_or_default(),
            None => String::new(),
        };

        if !status.success() {
            let reason = if stderr_output.trim().is_empty() {
                format!("docker exited with {}", status.code().unwrap_or(-1))
            } else {
                stderr_output.trim().to_string()
            };
            return Err(DockerFailure::Exit(reason));
        }

        Ok(())
    }
}

/// Outcome of a raw docker invocation, before mapping to a step error
enum DockerFailure {
    /// The process could not be spawned or awaited
    Spawn(String),
    /// The process exited non-zero
    Exit(String),
    /// The invocation exceeded its timeout
    Timeout {
        /// Timeout in seconds
        seconds: u64,
    },
}

impl RegistryOperations for DockerCli {
    async fn login(&self, username: &str, token: &Credential) -> Result<()> {
        let mut command = Command::new("docker");
        command.arg("login");
        if let Some(server) = &self.server {
            command.arg(server);
        }
        command
            .args(["--username", username, "--password-stdin"])
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| AuthError::LoginFailed {
            registry: self.registry_name(),
            reason: e.to_string(),
        })?;

        // The credential crosses to the child over stdin only
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(token.expose().as_bytes())
                .await
                .map_err(|e| AuthError::LoginFailed {
                    registry: self.registry_name(),
                    reason: e.to_string(),
                })?;
            drop(stdin);
        }

        let output = timeout(Duration::from_secs(self.timeouts.auth), child.wait_with_output())
            .await
            .map_err(|_| AuthError::Timeout {
                seconds: self.timeouts.auth,
            })?
            .map_err(|e| AuthError::LoginFailed {
                registry: self.registry_name(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr.replace(token.expose(), "****").trim().to_string();
            return Err(AuthError::LoginFailed {
                registry: self.registry_name(),
                reason,
            }
            .into());
        }

        Ok(())
    }

    async fn tag_exists(&self, image: &ImageRef) -> Result<bool> {
        let url = self.tag_url(image)?;

        let response = self.http.get(url).send().await.map_err(|e| {
            PublishError::RegistryProbeFailed {
                reason: e.to_string(),
            }
        })?;

        match response.status() {
            reqwest::StatusCode::OK => Ok(true),
            reqwest::StatusCode::NOT_FOUND => Ok(false),
            status => Err(PublishError::RegistryProbeFailed {
                reason: format!("unexpected status {} for {}", status, image),
            }
            .into()),
        }
    }

    async fn build_image(&self, context: &Path, image: &ImageRef) -> Result<()> {
        if !context.exists() {
            return Err(BuildError::ContextMissing {
                path: context.to_path_buf(),
            }
            .into());
        }

        self.ensure_available().await?;

        let reference = image.to_string();
        self.run_streamed(
            &["build", "-t", &reference, "."],
            Some(context),
            self.timeouts.build,
        )
        .await
        .map_err(|failure| match failure {
            DockerFailure::Timeout { seconds } => BuildError::Timeout { seconds },
            DockerFailure::Spawn(reason) | DockerFailure::Exit(reason) => BuildError::BuildFailed {
                image: reference.clone(),
                reason,
            },
        })?;

        Ok(())
    }

    async fn push_image(&self, image: &ImageRef) -> Result<()> {
        let reference = image.to_string();
        self.run_streamed(&["push", &reference], None, self.timeouts.push)
            .await
            .map_err(|failure| match failure {
                DockerFailure::Timeout { seconds } => PublishError::Timeout { seconds },
                DockerFailure::Spawn(reason) | DockerFailure::Exit(reason) => {
                    PublishError::PushFailed {
                        image: reference.clone(),
                        reason,
                    }
                }
            })?;

        Ok(())
    }
}
