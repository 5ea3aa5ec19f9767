//! JSON shapes of the GitHub Actions REST responses.

use crate::runs::{Artifact, RunConclusion, RunHandle, RunStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Query string of the workflow runs listing.
#[derive(Debug, Serialize)]
pub(crate) struct ListRunsQuery<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub branch: Option<&'a str>,
    pub per_page: u8,
    pub page: u32,
}

/// `GET /repos/{owner}/{repo}/actions/workflows/{workflow}/runs`
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRunList {
    #[serde(default)]
    pub workflow_runs: Vec<WorkflowRun>,
}

/// One entry of a run listing, or `GET /repos/{owner}/{repo}/actions/runs/{id}`.
#[derive(Debug, Deserialize)]
pub(crate) struct WorkflowRun {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_title: Option<String>,
    #[serde(default)]
    pub status: Option<RunStatus>,
    #[serde(default)]
    pub conclusion: Option<RunConclusion>,
    pub created_at: DateTime<Utc>,
    pub html_url: String,
}

impl From<WorkflowRun> for RunHandle {
    fn from(run: WorkflowRun) -> Self {
        Self {
            id: run.id,
            created_at: run.created_at,
            status: run.status.unwrap_or(RunStatus::Queued),
            conclusion: run.conclusion,
            // Older runs have no display title; the run name is the next best thing.
            display_title: run.display_title.or(run.name).unwrap_or_default(),
            html_url: run.html_url,
        }
    }
}

/// Query string of paged listings without filters.
#[derive(Debug, Serialize)]
pub(crate) struct PageQuery {
    pub per_page: u8,
    pub page: u32,
}

/// `GET /repos/{owner}/{repo}/actions/runs/{id}/artifacts`
#[derive(Debug, Deserialize)]
pub(crate) struct ArtifactList {
    #[serde(default)]
    pub total_count: u64,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Returns true once a page came back short or everything was collected.
pub(crate) fn is_last_page(fetched: usize, per_page: u8, collected: usize, total: u64) -> bool {
    fetched < usize::from(per_page) || collected as u64 >= total
}
