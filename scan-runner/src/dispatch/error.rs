//! Dispatch error types.

use thiserror::Error;

/// Errors that can occur when triggering a workflow.
///
/// Dispatches are never retried: a retry after an ambiguous failure could
/// start a duplicate run.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// GitHub answered the dispatch with a non-success status.
    #[error("Dispatch rejected ({status}): {body}")]
    Rejected { status: u16, body: String },

    /// Transport or client error before a response was received.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),
}
