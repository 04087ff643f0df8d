//! Credential handling for registry and VCS tokens.
//!
//! Tokens are wrapped in [`Credential`] as soon as they are read from the
//! environment. The wrapper redacts both `Debug` and `Display`, so a token can
//! only end up in logs or error messages through [`Credential::expose`].

use crate::error::{AuthError, Result};

/// An opaque secret token with a redacted textual representation.
///
/// The inner string is only reachable through [`Credential::expose`], which is
/// called at the single point where the secret crosses into an external
/// process or request.
#[derive(Clone)]
pub struct Credential(String);

impl Credential {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Read a credential from the named environment variable
    pub fn from_env(variable: &str) -> Result<Self> {
        match std::env::var(variable) {
            Ok(value) if !value.is_empty() => Ok(Self(value)),
            _ => Err(AuthError::MissingCredential {
                variable: variable.to_string(),
            }
            .into()),
        }
    }

    /// Access the raw token.
    ///
    /// Call sites are the auth boundary: the value must go straight into a
    /// child process stdin or request body, never into a log line.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(****)")
    }
}

impl std::fmt::Display for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("****")
    }
}

/// The secrets a pipeline run consumes.
///
/// The registry token is required; the VCS token is optional and only used by
/// the versioning step to push release tags over HTTPS.
#[derive(Debug)]
pub struct Secrets {
    /// Artifact registry credential
    pub registry_token: Credential,
    /// Version-control platform token
    pub vcs_token: Option<Credential>,
}

impl Secrets {
    /// Read secrets from the environment using the configured variable names
    pub fn from_env(registry_variable: &str, vcs_variable: &str) -> Result<Self> {
        let registry_token = Credential::from_env(registry_variable)?;
        let vcs_token = Credential::from_env(vcs_variable).ok();

        Ok(Self {
            registry_token,
            vcs_token,
        })
    }
}
