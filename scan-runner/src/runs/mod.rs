//! Workflow runs and artifacts as observed from the CI system.
//!
//! [`RunSource`] is the seam between the polling logic and the CI API:
//! [`GitHubClient`](crate::github::GitHubClient) implements it for real,
//! tests implement it with scripted fakes.

mod artifact;
mod error;
mod handle;

pub use artifact::{Artifact, ArtifactReport};
pub use error::RunSourceError;
pub use handle::{RunConclusion, RunHandle, RunStatus};

use std::future::Future;

/// Event filter used for runs created by a workflow dispatch.
pub const DISPATCH_EVENT: &str = "workflow_dispatch";

/// Default page size for run listings.
pub const DEFAULT_PER_PAGE: u8 = 50;

/// Narrows a run listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunFilter {
    /// Only runs triggered by this event.
    pub event: Option<String>,

    /// Only runs on this branch.
    pub branch: Option<String>,

    /// Page size; only the first (most recent) page is fetched.
    pub per_page: u8,
}

impl Default for RunFilter {
    fn default() -> Self {
        Self {
            event: Some(DISPATCH_EVENT.to_string()),
            branch: None,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Read-only view of workflow runs.
pub trait RunSource {
    /// Lists the most recent runs, newest first.
    fn list_runs(
        &self,
        filter: &RunFilter,
    ) -> impl Future<Output = Result<Vec<RunHandle>, RunSourceError>> + Send;

    /// Fetches a single run snapshot.
    fn get_run(&self, run_id: u64)
        -> impl Future<Output = Result<RunHandle, RunSourceError>> + Send;

    /// Lists the artifacts of a run.
    fn list_artifacts(
        &self,
        run_id: u64,
    ) -> impl Future<Output = Result<Vec<Artifact>, RunSourceError>> + Send;
}
