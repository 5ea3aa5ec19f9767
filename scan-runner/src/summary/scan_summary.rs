//! Scan summary types.

use crate::correlation::{Correlation, CorrelationOutcome};
use crate::dispatch::DispatchReceipt;
use crate::runs::{ArtifactReport, RunHandle};
use serde::Serialize;

/// Summary of one dispatched scan.
#[derive(Debug, Clone, Serialize)]
pub struct ScanSummary {
    /// What was dispatched.
    pub dispatch: DispatchReceipt,

    /// Tag the workflow suffixes reports and artifacts with.
    pub input_tag: String,

    /// How the run was (or wasn't) found.
    pub correlation: Correlation,

    /// Last snapshot observed while watching.
    pub last_snapshot: Option<RunHandle>,

    /// Artifacts of the run, once it completed.
    pub artifacts: Option<ArtifactReport>,

    /// Where to look manually when the run was not found or not finished.
    pub actions_url: String,
}

impl ScanSummary {
    /// The correlated run, certain or guessed.
    #[must_use]
    pub fn run(&self) -> Option<&RunHandle> {
        self.correlation.outcome.run()
    }

    /// Returns true if the run was seen completing.
    #[must_use]
    pub fn completed(&self) -> bool {
        self.last_snapshot
            .as_ref()
            .is_some_and(RunHandle::is_completed)
    }

    /// Returns true if the run completed with a success conclusion.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.last_snapshot
            .as_ref()
            .is_some_and(RunHandle::succeeded)
    }

    /// Returns true if the run was identified only by the timestamp fallback.
    #[must_use]
    pub fn is_best_guess(&self) -> bool {
        matches!(self.correlation.outcome, CorrelationOutcome::BestGuess(_))
    }
}
