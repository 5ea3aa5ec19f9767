//! Runner error types.

/// Errors that can occur while running a scan.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// GitHub API client initialization errors.
    #[error(transparent)]
    Octocrab(#[from] octocrab::Error),

    /// The workflow dispatch was rejected. Fatal for the submission.
    #[error(transparent)]
    Dispatch(#[from] crate::dispatch::DispatchError),
}
