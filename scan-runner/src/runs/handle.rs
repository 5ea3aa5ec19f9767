//! Workflow run snapshot types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lifecycle status of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Waiting for a runner. GitHub's `waiting`, `requested` and `pending` land here too.
    #[serde(alias = "waiting", alias = "requested", alias = "pending")]
    Queued,

    /// Executing.
    InProgress,

    /// Finished; see [`RunConclusion`].
    Completed,
}

impl RunStatus {
    /// Returns the status as shown by GitHub.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

/// Outcome of a completed workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
    TimedOut,

    /// Any other conclusion GitHub reports (`skipped`, `neutral`, `action_required`, ...).
    #[serde(other)]
    Other,
}

impl RunConclusion {
    /// Returns the conclusion as a string for display.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Cancelled => "cancelled",
            Self::TimedOut => "timed_out",
            Self::Other => "other",
        }
    }
}

/// Snapshot of one workflow run as observed at a point in time.
///
/// The CI system mutates the run over its lifetime; this is never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunHandle {
    /// Run ID.
    pub id: u64,

    /// When the CI system created the run.
    pub created_at: DateTime<Utc>,

    /// Current lifecycle status.
    pub status: RunStatus,

    /// Conclusion; only meaningful once `status` is [`RunStatus::Completed`].
    pub conclusion: Option<RunConclusion>,

    /// Generated run title. Workflows embed the dispatch token here.
    pub display_title: String,

    /// Web URL of the run.
    pub html_url: String,
}

impl RunHandle {
    /// Returns true once the run reached [`RunStatus::Completed`].
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == RunStatus::Completed
    }

    /// Returns true if the run completed successfully.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.is_completed() && self.conclusion == Some(RunConclusion::Success)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_status_aliases() {
        let status: RunStatus = serde_json::from_str("\"waiting\"").unwrap();
        assert_eq!(status, RunStatus::Queued);
        let status: RunStatus = serde_json::from_str("\"in_progress\"").unwrap();
        assert_eq!(status, RunStatus::InProgress);
    }

    #[test]
    fn unknown_conclusion_maps_to_other() {
        let conclusion: RunConclusion = serde_json::from_str("\"startup_failure\"").unwrap();
        assert_eq!(conclusion, RunConclusion::Other);
        assert_eq!(conclusion.as_str(), "other");
    }
}
