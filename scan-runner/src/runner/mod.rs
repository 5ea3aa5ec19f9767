//! Orchestrates a scan from dispatch to artifacts.

mod error;

pub use error::RunnerError;

use crate::clock::{Clock, TokioClock};
use crate::completion::watch_run;
use crate::config::{CorrelationMode, ScanConfig};
use crate::correlation::{find_run, Correlation, CorrelationRequest, MatchPolicy};
use crate::dispatch::{dispatch_scan, DispatchReceipt, DispatchToken, Dispatcher};
use crate::github::GitHubClient;
use crate::runs::{ArtifactReport, RunHandle, RunSource};
use crate::summary::ScanSummary;
use crate::target::ScanTarget;
use futures::StreamExt;
use octocrab::Octocrab;
use std::pin::pin;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Dispatches scans and follows them through to their artifacts.
///
/// `B` is the CI backend (dispatch plus run listing), `C` the time source.
pub struct Runner<B = GitHubClient, C = TokioClock> {
    config: ScanConfig,
    client: B,
    clock: C,
}

impl Runner {
    /// Builds a runner authenticated with an opaque bearer `token`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Octocrab`] if the GitHub client cannot be built.
    pub fn new(config: ScanConfig, token: String) -> Result<Self, RunnerError> {
        let octocrab = Octocrab::builder().personal_token(token).build()?;
        let client = GitHubClient::new(octocrab, config.target.clone());
        Ok(Self::with_backend(config, client, TokioClock))
    }
}

impl<B, C> Runner<B, C> {
    /// Builds a runner over any backend and clock.
    pub fn with_backend(config: ScanConfig, client: B, clock: C) -> Self {
        Self {
            config,
            client,
            clock,
        }
    }

    /// Returns the CI backend.
    pub fn client(&self) -> &B {
        &self.client
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }
}

impl<B, C> Runner<B, C>
where
    B: Dispatcher + RunSource,
    C: Clock,
{
    /// Executes dispatch, correlation, watch and artifact listing.
    ///
    /// Only a rejected dispatch is an error. A run that cannot be found, or
    /// does not complete in time, is reported in the summary.
    pub async fn scan(
        &self,
        target: &ScanTarget,
        token: DispatchToken,
        cancel: &CancellationToken,
    ) -> Result<ScanSummary, RunnerError> {
        let input_tag = target.input_tag();
        info!(scan_type = target.scan_type(), %input_tag, "Starting scan");

        let receipt = dispatch_scan(&self.client, target, token, &self.config.agents).await?;
        let correlation = self.correlate(&receipt, cancel).await;

        let mut last_snapshot = None;
        let mut artifacts = None;
        if let Some(run) = correlation.outcome.run() {
            info!(run_id = run.id, url = %run.html_url, "Tracking run");
            last_snapshot = self.watch(run.id, cancel).await;

            if last_snapshot.as_ref().is_some_and(RunHandle::is_completed) {
                artifacts = self.artifacts(run.id).await;
            }
        } else {
            warn!(
                url = %self.config.target.actions_url(),
                "Could not locate the run, check the Actions page"
            );
        }

        Ok(ScanSummary {
            dispatch: receipt,
            input_tag,
            correlation,
            last_snapshot,
            artifacts,
            actions_url: self.config.target.actions_url(),
        })
    }

    /// Finds the run created by `receipt` using the configured correlation mode.
    pub async fn correlate(
        &self,
        receipt: &DispatchReceipt,
        cancel: &CancellationToken,
    ) -> Correlation {
        let policy = match self.config.correlation {
            CorrelationMode::Token => MatchPolicy::Token(receipt.token.as_str().to_string()),
            CorrelationMode::Timestamp => MatchPolicy::Since(receipt.dispatched_at),
        };
        let request = CorrelationRequest {
            policy,
            filter: self.config.run_filter(),
            timeout: self.config.polling.find_timeout,
            poll_interval: self.config.polling.find_interval,
        };
        find_run(&self.client, &self.clock, &request, cancel).await
    }

    /// Watches a run until it completes, logging each snapshot.
    ///
    /// Returns the last snapshot seen, if any fetch succeeded.
    pub async fn watch(&self, run_id: u64, cancel: &CancellationToken) -> Option<RunHandle> {
        let mut snapshots = pin!(watch_run(
            &self.client,
            &self.clock,
            run_id,
            self.config.polling.watch_timeout,
            self.config.polling.watch_interval,
            cancel.clone(),
        ));

        let mut last = None;
        while let Some(snapshot) = snapshots.next().await {
            if let Ok(run) = snapshot {
                info!(
                    run_id,
                    status = run.status.as_str(),
                    conclusion = run.conclusion.map(|c| c.as_str()).unwrap_or("-"),
                    "Run status"
                );
                last = Some(run);
            }
        }

        if !last.as_ref().is_some_and(RunHandle::is_completed) {
            warn!(run_id, "Run did not complete before the watch timeout, outcome unknown");
        }
        last
    }

    /// Lists the run's artifacts. Failures are logged, not returned.
    pub async fn artifacts(&self, run_id: u64) -> Option<ArtifactReport> {
        match self.client.list_artifacts(run_id).await {
            Ok(artifacts) => {
                let report = ArtifactReport::from_artifacts(run_id, artifacts);
                info!(
                    run_id,
                    available = report.available.len(),
                    expired = report.expired.len(),
                    "Listed artifacts"
                );
                Some(report)
            }
            Err(e) => {
                warn!(run_id, error = %e, "Failed to list artifacts");
                None
            }
        }
    }
}
