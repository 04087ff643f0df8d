//! Trigger events and branch filtering.
//!
//! A trigger event is created by the orchestration platform (or the CLI
//! standing in for it) and consumed exactly once per run. [`TriggerRules`]
//! carries the branch filters the source workflow hardcoded.

use serde::{Deserialize, Serialize};

/// The external occurrence that starts a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TriggerEvent {
    /// A commit was pushed to a branch
    Push {
        /// Branch that received the push
        branch: String,
    },
    /// A pull request was opened or updated
    PullRequest {
        /// Branch the pull request comes from
        source_branch: String,
        /// Branch the pull request targets
        target_branch: String,
    },
    /// The pipeline was invoked manually, with no parameters
    ManualDispatch,
}

impl TriggerEvent {
    /// Whether this is a push event.
    ///
    /// Version computation and publishing only run for pushes.
    pub fn is_push(&self) -> bool {
        matches!(self, TriggerEvent::Push { .. })
    }

    /// The ref the fetch step should check out, if the event names one
    pub fn ref_name(&self) -> Option<&str> {
        match self {
            TriggerEvent::Push { branch } => Some(branch),
            TriggerEvent::PullRequest { source_branch, .. } => Some(source_branch),
            TriggerEvent::ManualDispatch => None,
        }
    }

    /// Short human-readable description for logs and run records
    pub fn describe(&self) -> String {
        match self {
            TriggerEvent::Push { branch } => format!("push to '{}'", branch),
            TriggerEvent::PullRequest {
                source_branch,
                target_branch,
            } => format!(
                "pull request '{}' -> '{}'",
                source_branch, target_branch
            ),
            TriggerEvent::ManualDispatch => "manual dispatch".to_string(),
        }
    }
}

/// Branch filters deciding which events start a run at all
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TriggerRules {
    /// Branches whose pushes start a run
    pub push_branches: Vec<String>,
    /// Target branches whose pull requests start a run
    pub pull_request_targets: Vec<String>,
}

impl Default for TriggerRules {
    fn default() -> Self {
        Self {
            push_branches: vec!["master".to_string(), "main".to_string()],
            pull_request_targets: vec!["beta".to_string(), "master".to_string()],
        }
    }
}

impl TriggerRules {
    /// Whether the rules cover the given event.
    ///
    /// Uncovered events are ignored, which is distinct from both skipping and
    /// failing: no run is recorded for them.
    pub fn covers(&self, event: &TriggerEvent) -> bool {
        match event {
            TriggerEvent::Push { branch } => self.push_branches.iter().any(|b| b == branch),
            TriggerEvent::PullRequest { target_branch, .. } => self
                .pull_request_targets
                .iter()
                .any(|b| b == target_branch),
            TriggerEvent::ManualDispatch => true,
        }
    }
}
