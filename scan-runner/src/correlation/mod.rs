//! Correlating a workflow dispatch with the run it created.
//!
//! The dispatch call returns no run ID, so the run has to be found in the
//! run listing, which lags behind the dispatch. [`find_run`] polls the
//! listing until the [`MatchPolicy`] picks a run or the deadline passes.

mod outcome;
mod policy;

pub use outcome::{Correlation, CorrelationOutcome};
pub use policy::{MatchPolicy, SINCE_TOLERANCE};

use crate::clock::{race, remaining, sleep_or_cancel, Clock, Raced};
use crate::runs::{RunFilter, RunHandle, RunSource};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

/// Parameters of one correlation attempt.
#[derive(Debug, Clone)]
pub struct CorrelationRequest {
    /// How the run is recognized.
    pub policy: MatchPolicy,

    /// Listing filter passed to every `list_runs` call.
    pub filter: RunFilter,

    /// Wall-clock bound for the whole attempt.
    pub timeout: Duration,

    /// Pause between listings.
    pub poll_interval: Duration,
}

/// Polls the run listing until the dispatched run shows up.
///
/// The deadline is checked before every listing; each listing and each sleep
/// is bounded by the time left and raced against `cancel`, so the call
/// returns within one poll interval of `timeout` even if the source hangs.
/// A failed listing is logged and counted but does not end the attempt.
///
/// # Arguments
///
/// * `source` - Where runs are listed from
/// * `clock` - Time source for the deadline and sleeps
/// * `request` - Policy, filter and timing
/// * `cancel` - Checked before each listing and raced against each listing and sleep
pub async fn find_run<S, C>(
    source: &S,
    clock: &C,
    request: &CorrelationRequest,
    cancel: &CancellationToken,
) -> Correlation
where
    S: RunSource,
    C: Clock,
{
    let span = info_span!("find_run", policy = %request.policy);

    async {
        let deadline = clock.now() + request.timeout;
        let mut attempts = 0;
        let mut transient_failures = 0;
        let mut last_page: Vec<RunHandle> = Vec::new();

        let outcome = loop {
            if cancel.is_cancelled() {
                info!(attempts, "Correlation cancelled");
                break CorrelationOutcome::Cancelled;
            }
            let Some(left) = remaining(clock, deadline) else {
                break timed_out(&request.policy, &last_page, attempts);
            };

            attempts += 1;
            let listing = match race(clock, left, cancel, source.list_runs(&request.filter)).await
            {
                Raced::Done(listing) => listing,
                Raced::Cancelled => {
                    info!(attempts, "Correlation cancelled");
                    break CorrelationOutcome::Cancelled;
                }
                Raced::TimedOut => {
                    warn!(attempt = attempts, "Run listing still pending at the deadline");
                    break timed_out(&request.policy, &last_page, attempts);
                }
            };
            match listing {
                Ok(runs) => {
                    debug!(attempt = attempts, count = runs.len(), "Listed runs");
                    if let Some(run) = request.policy.select(&runs) {
                        info!(run_id = run.id, attempts, "Found dispatched run");
                        break CorrelationOutcome::Found(run.clone());
                    }
                    if !runs.is_empty() {
                        last_page = runs;
                    }
                }
                Err(e) => {
                    transient_failures += 1;
                    warn!(attempt = attempts, error = %e, "Failed to list runs");
                }
            }

            let Some(left) = remaining(clock, deadline) else {
                continue;
            };
            if sleep_or_cancel(clock, request.poll_interval.min(left), cancel).await {
                info!(attempts, "Correlation cancelled");
                break CorrelationOutcome::Cancelled;
            }
        };

        Correlation {
            outcome,
            attempts,
            transient_failures,
        }
    }
    .instrument(span)
    .await
}

/// Resolves the outcome once the deadline has passed.
fn timed_out(policy: &MatchPolicy, last_page: &[RunHandle], attempts: usize) -> CorrelationOutcome {
    match policy.best_guess(last_page) {
        Some(run) => {
            warn!(
                run_id = run.id,
                attempts, "No run matched before timeout, using most recent run"
            );
            CorrelationOutcome::BestGuess(run.clone())
        }
        None => {
            info!(attempts, "No matching run before timeout");
            CorrelationOutcome::NotFound
        }
    }
}
