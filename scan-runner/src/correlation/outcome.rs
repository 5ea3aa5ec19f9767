//! Correlation results.

use crate::runs::RunHandle;
use serde::Serialize;

/// Terminal state of one correlation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "run", rename_all = "snake_case")]
pub enum CorrelationOutcome {
    /// The dispatched run was identified.
    Found(RunHandle),

    /// Timed out; the newest run seen is returned as a probable match.
    BestGuess(RunHandle),

    /// Timed out with nothing to offer. Not an error: the run may still show up.
    NotFound,

    /// The caller cancelled the attempt.
    Cancelled,
}

impl CorrelationOutcome {
    /// Returns the correlated run, certain or guessed.
    #[must_use]
    pub fn run(&self) -> Option<&RunHandle> {
        match self {
            Self::Found(run) | Self::BestGuess(run) => Some(run),
            Self::NotFound | Self::Cancelled => None,
        }
    }

    /// Returns the outcome as a string for display.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Found(_) => "found",
            Self::BestGuess(_) => "best_guess",
            Self::NotFound => "not_found",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Outcome of [`find_run`](super::find_run) plus how it got there.
#[derive(Debug, Clone, Serialize)]
pub struct Correlation {
    /// Terminal state.
    pub outcome: CorrelationOutcome,

    /// Number of `list_runs` calls made.
    pub attempts: usize,

    /// Number of those calls that failed.
    pub transient_failures: usize,
}
