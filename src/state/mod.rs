//! Run state tracking and the run report.
//!
//! Each trigger starts a fresh run in [`RunState::Start`]; steps only ever
//! move the state forward, and `Failed` is reachable from every non-terminal
//! state. The [`RunRecord`] is the serializable account of one run, written as
//! a JSON report when the run finishes.

use crate::error::{Result, StateError};
use crate::trigger::TriggerEvent;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// State of a pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunState {
    /// Run created, nothing executed yet
    Start,
    /// Source checked out at the triggering ref
    Fetched,
    /// Declared dependencies installed
    DepsInstalled,
    /// Registry session established
    Authenticated,
    /// Version decision computed
    VersionComputed,
    /// Image built and pushed
    Published,
    /// Versioning or publish skipped (non-push trigger, or no new release)
    Skipped,
    /// Run finished successfully
    Done,
    /// Run halted on a step failure
    Failed {
        /// Step that failed
        step: String,
        /// Underlying error message
        reason: String,
    },
}

impl RunState {
    /// Whether the run can never leave this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Done | RunState::Failed { .. })
    }

    /// Whether this state may advance to `next`.
    ///
    /// Transitions only move forward; no state is ever re-entered.
    pub fn can_advance_to(&self, next: &RunState) -> bool {
        if matches!(next, RunState::Failed { .. }) {
            return !self.is_terminal();
        }
        matches!(
            (self, next),
            (RunState::Start, RunState::Fetched)
                | (RunState::Fetched, RunState::DepsInstalled)
                | (RunState::DepsInstalled, RunState::Authenticated)
                | (RunState::Authenticated, RunState::VersionComputed)
                | (RunState::Authenticated, RunState::Skipped)
                | (RunState::VersionComputed, RunState::Published)
                | (RunState::VersionComputed, RunState::Skipped)
                | (RunState::Published, RunState::Done)
                | (RunState::Skipped, RunState::Done)
        )
    }

    fn label(&self) -> String {
        match self {
            RunState::Start => "start".to_string(),
            RunState::Fetched => "fetched".to_string(),
            RunState::DepsInstalled => "deps-installed".to_string(),
            RunState::Authenticated => "authenticated".to_string(),
            RunState::VersionComputed => "version-computed".to_string(),
            RunState::Published => "published".to_string(),
            RunState::Skipped => "skipped".to_string(),
            RunState::Done => "done".to_string(),
            RunState::Failed { step, .. } => format!("failed({})", step),
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.label())
    }
}

/// Terminal status of a single step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepStatus {
    /// Step ran and succeeded
    Succeeded,
    /// Step did not run; its precondition did not hold
    Skipped {
        /// Why the step was skipped
        reason: String,
    },
    /// Step ran and failed
    Failed {
        /// Why the step failed
        reason: String,
    },
}

impl StepStatus {
    /// Whether the step succeeded
    pub fn is_success(&self) -> bool {
        matches!(self, StepStatus::Succeeded)
    }

    /// Whether the step was skipped (distinct from failed)
    pub fn is_skipped(&self) -> bool {
        matches!(self, StepStatus::Skipped { .. })
    }
}

/// Record of a single executed (or skipped) step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// Step name
    pub name: String,
    /// Terminal status
    pub status: StepStatus,
    /// Outputs later steps may read
    pub outputs: BTreeMap<String, String>,
    /// When the step started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When the step finished
    pub finished_at: chrono::DateTime<chrono::Utc>,
}

/// Complete, serializable account of one pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique ID for this run
    pub run_id: uuid::Uuid,
    /// Event that started the run
    pub trigger: TriggerEvent,
    /// When the run started
    pub started_at: chrono::DateTime<chrono::Utc>,
    /// When the run was last updated
    pub updated_at: chrono::DateTime<chrono::Utc>,
    /// Current run state
    pub state: RunState,
    /// Step records in execution order
    pub steps: Vec<StepRecord>,
}

impl RunRecord {
    /// Create a fresh run for a trigger event
    pub fn new(trigger: TriggerEvent) -> Self {
        let now = chrono::Utc::now();
        Self {
            run_id: uuid::Uuid::new_v4(),
            trigger,
            started_at: now,
            updated_at: now,
            state: RunState::Start,
            steps: Vec::new(),
        }
    }

    /// Advance the run state, rejecting illegal transitions
    pub fn advance(&mut self, next: RunState) -> Result<()> {
        if !self.state.can_advance_to(&next) {
            return Err(StateError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            }
            .into());
        }
        self.state = next;
        self.updated_at = chrono::Utc::now();
        Ok(())
    }

    /// Append a step record
    pub fn record_step(&mut self, step: StepRecord) {
        self.steps.push(step);
        self.updated_at = chrono::Utc::now();
    }

    /// Outputs of an earlier step, by name.
    ///
    /// Steps are recorded in execution order, so anything found here ran
    /// strictly before the caller.
    pub fn outputs_of(&self, step_name: &str) -> Option<&BTreeMap<String, String>> {
        self.steps
            .iter()
            .find(|step| step.name == step_name)
            .map(|step| &step.outputs)
    }

    /// The failed step and reason, when the run failed
    pub fn failure(&self) -> Option<(&str, &str)> {
        match &self.state {
            RunState::Failed { step, reason } => Some((step.as_str(), reason.as_str())),
            _ => None,
        }
    }

    /// One-line summary for logs
    pub fn summary(&self) -> String {
        let elapsed = self.updated_at - self.started_at;
        format!(
            "run {} ({}) - {} - {} steps in {}s",
            self.run_id,
            self.trigger.describe(),
            self.state,
            self.steps.len(),
            elapsed.num_seconds()
        )
    }

    /// Write the run report as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| StateError::SaveFailed {
            reason: format!("{}: {}", path.display(), e),
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_record() -> RunRecord {
        RunRecord::new(TriggerEvent::Push {
            branch: "main".to_string(),
        })
    }

    fn failed(step: &str) -> RunState {
        RunState::Failed {
            step: step.to_string(),
            reason: "boom".to_string(),
        }
    }

    #[test]
    fn test_happy_path_published() {
        let mut record = push_record();
        for state in [
            RunState::Fetched,
            RunState::DepsInstalled,
            RunState::Authenticated,
            RunState::VersionComputed,
            RunState::Published,
            RunState::Done,
        ] {
            record.advance(state).unwrap();
        }
        assert!(record.state.is_terminal());
        assert!(record.failure().is_none());
    }

    #[test]
    fn test_skip_path_from_authenticated() {
        let mut record = push_record();
        record.advance(RunState::Fetched).unwrap();
        record.advance(RunState::DepsInstalled).unwrap();
        record.advance(RunState::Authenticated).unwrap();
        record.advance(RunState::Skipped).unwrap();
        record.advance(RunState::Done).unwrap();
        assert_eq!(record.state, RunState::Done);
    }

    #[test]
    fn test_no_transition_returns_to_earlier_state() {
        let mut record = push_record();
        record.advance(RunState::Fetched).unwrap();
        record.advance(RunState::DepsInstalled).unwrap();
        assert!(record.advance(RunState::Fetched).is_err());
        assert!(record.advance(RunState::Start).is_err());
    }

    #[test]
    fn test_no_step_skipping() {
        let mut record = push_record();
        assert!(record.advance(RunState::Authenticated).is_err());
        assert!(record.advance(RunState::Published).is_err());
    }

    #[test]
    fn test_failed_reachable_from_any_nonterminal() {
        let mut record = push_record();
        record.advance(RunState::Fetched).unwrap();
        record.advance(failed("install-dependencies")).unwrap();
        assert_eq!(
            record.failure(),
            Some(("install-dependencies", "boom"))
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut record = push_record();
        record.advance(failed("fetch-source")).unwrap();
        assert!(record.advance(RunState::Fetched).is_err());
        assert!(record.advance(failed("again")).is_err());
    }

    #[test]
    fn test_skipped_is_distinct_from_failed() {
        assert!(
            StepStatus::Skipped {
                reason: "not a push".to_string()
            }
            .is_skipped()
        );
        assert!(
            !StepStatus::Failed {
                reason: "boom".to_string()
            }
            .is_skipped()
        );
    }

    #[test]
    fn test_outputs_of_earlier_step() {
        let mut record = push_record();
        let now = chrono::Utc::now();
        let mut outputs = BTreeMap::new();
        outputs.insert("new_release_version".to_string(), "1.2.1".to_string());
        record.record_step(StepRecord {
            name: "compute-version".to_string(),
            status: StepStatus::Succeeded,
            outputs,
            started_at: now,
            finished_at: now,
        });

        let outputs = record.outputs_of("compute-version").unwrap();
        assert_eq!(outputs.get("new_release_version").unwrap(), "1.2.1");
        assert!(record.outputs_of("build-and-push").is_none());
    }

    #[test]
    fn test_save_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.json");
        let record = push_record();
        record.save(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"state\": \"start\""));
        assert!(content.contains("\"kind\": \"push\""));
    }
}
