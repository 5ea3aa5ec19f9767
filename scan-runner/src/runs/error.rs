//! Run source error types.

use thiserror::Error;

/// Errors from a single list/get call against the CI system.
///
/// Polling loops treat every variant as transient until their deadline.
#[derive(Debug, Error)]
pub enum RunSourceError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// The run does not exist (yet).
    #[error("Run {run_id} not found")]
    RunNotFound { run_id: u64 },

    /// Rate limit exhausted and the reset is too far away to wait for.
    #[error("Rate limit exceeded, reset at {reset_at}")]
    RateLimitExceeded { reset_at: u64 },
}
