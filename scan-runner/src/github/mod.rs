//! GitHub Actions client.
//!
//! Implements [`RunSource`] over the Actions REST API and adds the calls
//! that mutate or download: workflow dispatch and artifact download.

mod error;
mod refs;
mod wire;

pub use error::DownloadError;
pub use refs::{RefCatalog, RefChoice, RefKind};

use crate::dispatch::{DispatchError, Dispatcher};
use crate::rate_limit::ensure_core_rate_limit;
use crate::runs::{Artifact, RunFilter, RunHandle, RunSource, RunSourceError};
use octocrab::models::ArtifactId;
use octocrab::params::actions::ArchiveFormat as DownloadFormat;
use octocrab::{Octocrab, Page};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, info_span, Instrument};
use wire::{is_last_page, ArtifactList, ListRunsQuery, PageQuery, WorkflowRun, WorkflowRunList};

/// Page size for branch and tag listings.
const REFS_PER_PAGE: u8 = 100;

/// Page size for artifact listings.
const ARTIFACTS_PER_PAGE: u8 = 100;

/// The workflow that scans are dispatched to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowTarget {
    /// Owner of the repository holding the workflow.
    pub owner: String,

    /// Repository holding the workflow.
    pub repo: String,

    /// Workflow file name, e.g. `fossology.yml`.
    pub workflow: String,

    /// Branch the workflow is dispatched on.
    pub branch: String,
}

impl WorkflowTarget {
    /// Web page listing the workflow's runs; the manual fallback when a run cannot be found.
    #[must_use]
    pub fn actions_url(&self) -> String {
        format!("https://github.com/{}/{}/actions", self.owner, self.repo)
    }
}

/// Authenticated client bound to one workflow.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
    target: WorkflowTarget,
}

impl GitHubClient {
    /// Creates a client for `target`.
    pub fn new(octocrab: Octocrab, target: WorkflowTarget) -> Self {
        Self { octocrab, target }
    }

    /// Returns the workflow this client is bound to.
    pub fn target(&self) -> &WorkflowTarget {
        &self.target
    }

    /// Lists every branch and tag of `owner/name`.
    ///
    /// # Errors
    ///
    /// Returns an error if any page fails to load.
    pub async fn list_refs(&self, owner: &str, name: &str) -> Result<RefCatalog, octocrab::Error> {
        let span = info_span!("list_refs", repo = %format!("{owner}/{name}"));

        async {
            let repo = self.octocrab.repos(owner, name);

            let first = repo.list_branches().per_page(REFS_PER_PAGE).send().await?;
            let branches = self
                .collect_pages(first)
                .await?
                .into_iter()
                .map(|branch| branch.name)
                .collect::<Vec<_>>();

            let first = repo.list_tags().per_page(REFS_PER_PAGE).send().await?;
            let tags = self
                .collect_pages(first)
                .await?
                .into_iter()
                .map(|tag| tag.name)
                .collect::<Vec<_>>();

            info!(
                branches = branches.len(),
                tags = tags.len(),
                "Loaded branches and tags"
            );
            Ok(RefCatalog { branches, tags })
        }
        .instrument(span)
        .await
    }

    /// Follows `next` links until the last page.
    async fn collect_pages<T>(&self, mut page: Page<T>) -> Result<Vec<T>, octocrab::Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let mut items = std::mem::take(&mut page.items);
        while let Some(mut next) = self.octocrab.get_page::<T>(&page.next).await? {
            items.append(&mut next.items);
            page = next;
        }
        Ok(items)
    }

    /// Downloads an artifact zip into `dir` as `<name>.zip`.
    ///
    /// The download goes through the API with the bearer credential; the
    /// browser URL of an artifact rejects unauthenticated requests.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::Expired`] for expired artifacts without
    /// calling the API.
    pub async fn download_artifact(
        &self,
        artifact: &Artifact,
        dir: &Path,
    ) -> Result<PathBuf, DownloadError> {
        if artifact.expired {
            return Err(DownloadError::Expired {
                name: artifact.name.clone(),
            });
        }

        ensure_core_rate_limit(&self.octocrab).await?;

        let bytes = self
            .octocrab
            .actions()
            .download_artifact(
                &self.target.owner,
                &self.target.repo,
                ArtifactId(artifact.id),
                DownloadFormat::Zip,
            )
            .await?;

        let path = dir.join(format!("{}.zip", artifact.name));
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| DownloadError::IoError {
                path: dir.display().to_string(),
                source,
            })?;
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|source| DownloadError::IoError {
                path: path.display().to_string(),
                source,
            })?;

        info!(artifact = %artifact.name, path = %path.display(), size = bytes.len(), "Downloaded artifact");
        Ok(path)
    }

    fn repo_route(&self) -> String {
        format!("/repos/{}/{}", self.target.owner, self.target.repo)
    }
}

impl Dispatcher for GitHubClient {
    fn workflow(&self) -> &str {
        &self.target.workflow
    }

    /// Triggers the workflow with `inputs`. Sent once; never retried.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Rejected`] with status and message if GitHub refuses.
    async fn dispatch(&self, inputs: &BTreeMap<String, String>) -> Result<(), DispatchError> {
        let inputs: serde_json::Map<String, serde_json::Value> = inputs
            .iter()
            .map(|(key, value)| (key.clone(), serde_json::Value::String(value.clone())))
            .collect();

        let result = self
            .octocrab
            .actions()
            .create_workflow_dispatch(
                &self.target.owner,
                &self.target.repo,
                &self.target.workflow,
                &self.target.branch,
            )
            .inputs(serde_json::Value::Object(inputs))
            .send()
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(octocrab::Error::GitHub { source, .. }) => Err(DispatchError::Rejected {
                status: source.status_code.as_u16(),
                body: source.message.clone(),
            }),
            Err(e) => Err(DispatchError::GitHubError(e)),
        }
    }
}

impl RunSource for GitHubClient {
    async fn list_runs(&self, filter: &RunFilter) -> Result<Vec<RunHandle>, RunSourceError> {
        ensure_core_rate_limit(&self.octocrab).await?;

        let route = format!(
            "{}/actions/workflows/{}/runs",
            self.repo_route(),
            self.target.workflow
        );
        let query = ListRunsQuery {
            event: filter.event.as_deref(),
            branch: filter.branch.as_deref(),
            per_page: filter.per_page,
            page: 1,
        };
        let list: WorkflowRunList = self.octocrab.get(route, Some(&query)).await?;

        debug!(count = list.workflow_runs.len(), "Fetched workflow runs");
        Ok(list.workflow_runs.into_iter().map(Into::into).collect())
    }

    async fn get_run(&self, run_id: u64) -> Result<RunHandle, RunSourceError> {
        ensure_core_rate_limit(&self.octocrab).await?;

        let route = format!("{}/actions/runs/{run_id}", self.repo_route());
        match self.octocrab.get::<WorkflowRun, _, ()>(route, None).await {
            Ok(run) => Ok(run.into()),
            Err(e) if is_not_found(&e) => Err(RunSourceError::RunNotFound { run_id }),
            Err(e) => Err(e.into()),
        }
    }

    async fn list_artifacts(&self, run_id: u64) -> Result<Vec<Artifact>, RunSourceError> {
        let route = format!("{}/actions/runs/{run_id}/artifacts", self.repo_route());
        let mut artifacts = Vec::new();

        for page in 1.. {
            ensure_core_rate_limit(&self.octocrab).await?;

            let query = PageQuery {
                per_page: ARTIFACTS_PER_PAGE,
                page,
            };
            let list: ArtifactList = match self.octocrab.get(&route, Some(&query)).await {
                Ok(list) => list,
                Err(e) if is_not_found(&e) => return Err(RunSourceError::RunNotFound { run_id }),
                Err(e) => return Err(e.into()),
            };

            let fetched = list.artifacts.len();
            artifacts.extend(list.artifacts);
            if is_last_page(fetched, ARTIFACTS_PER_PAGE, artifacts.len(), list.total_count) {
                break;
            }
        }

        debug!(run_id, count = artifacts.len(), "Fetched artifacts");
        Ok(artifacts)
    }
}

/// Returns true for a GitHub 404 response.
fn is_not_found(error: &octocrab::Error) -> bool {
    matches!(error, octocrab::Error::GitHub { source, .. } if source.status_code.as_u16() == 404)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_actions_url() {
        let target = WorkflowTarget {
            owner: "acme".to_string(),
            repo: "scans".to_string(),
            workflow: "fossology.yml".to_string(),
            branch: "main".to_string(),
        };
        assert_eq!(target.actions_url(), "https://github.com/acme/scans/actions");
    }
}
