//! Artifact download error types.

use crate::runs::RunSourceError;
use thiserror::Error;

/// Errors that can occur while downloading an artifact.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// GitHub API error.
    #[error("GitHub API error: {0}")]
    GitHubError(#[from] octocrab::Error),

    /// Rate limit check failed or quota is exhausted.
    #[error(transparent)]
    RateLimit(#[from] RunSourceError),

    /// The artifact is past retention.
    #[error("Artifact '{name}' has expired")]
    Expired { name: String },

    /// Failed to write the downloaded archive.
    #[error("Failed to write file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
