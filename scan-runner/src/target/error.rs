//! Scan target error types.

use thiserror::Error;

/// Errors that can occur while building a scan target.
#[derive(Debug, Error)]
pub enum TargetError {
    /// Docker image reference is empty.
    #[error("Docker image must not be empty")]
    EmptyImage,

    /// Repository URL does not match the hosting URL shape or an allowed host.
    #[error("Not a repository URL on an allowed host ({allowed}): '{input}'")]
    MalformedReference { input: String, allowed: String },

    /// Resolved ref is not a valid git ref name.
    #[error("Invalid git ref '{reference}': {message}")]
    InvalidRef { reference: String, message: String },

    /// Archive URL is not an http(s) URL.
    #[error("Invalid archive URL '{input}': {message}")]
    InvalidArchiveUrl { input: String, message: String },

    /// Archive format could not be inferred from the URL.
    #[error("Cannot infer archive format from '{input}'; pass it explicitly")]
    UnknownArchiveFormat { input: String },
}
