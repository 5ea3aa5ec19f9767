//! Watching a correlated run until it completes.

use crate::clock::{race, remaining, sleep_or_cancel, Clock, Raced};
use crate::runs::{RunHandle, RunSource, RunSourceError};
use futures::stream::{self, Stream};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Polls a single run and yields every snapshot until it completes.
///
/// The stream is lazy: the deadline starts at the first poll, the first fetch
/// happens immediately and each later fetch waits `poll_interval`. It ends
/// right after the first [`Completed`](crate::runs::RunStatus::Completed)
/// snapshot with no further fetch. It also ends when the deadline passes or
/// `cancel` fires, including while a fetch is still in flight; the run
/// outcome is then unknown, not failed.
///
/// Failed fetches are yielded as `Err` items and polling continues.
///
/// # Arguments
///
/// * `source` - Where the run is fetched from
/// * `clock` - Time source for the deadline and sleeps
/// * `run_id` - Run to watch
/// * `timeout` - Bound for the whole watch
/// * `poll_interval` - Pause between fetches
/// * `cancel` - Ends the stream early when cancelled
pub fn watch_run<'a, S, C>(
    source: &'a S,
    clock: &'a C,
    run_id: u64,
    timeout: Duration,
    poll_interval: Duration,
    cancel: CancellationToken,
) -> impl Stream<Item = Result<RunHandle, RunSourceError>> + 'a
where
    S: RunSource,
    C: Clock,
{
    let state = WatchState {
        source,
        clock,
        run_id,
        timeout,
        poll_interval,
        cancel,
        deadline: None,
        finished: false,
    };

    stream::unfold(state, |mut state| async move {
        if state.finished {
            return None;
        }

        match state.deadline {
            None => state.deadline = Some(state.clock.now() + state.timeout),
            Some(deadline) => {
                let left = remaining(state.clock, deadline)?;
                if sleep_or_cancel(state.clock, state.poll_interval.min(left), &state.cancel).await
                {
                    info!(run_id = state.run_id, "Watch cancelled");
                    return None;
                }
            }
        }

        if state.cancel.is_cancelled() {
            info!(run_id = state.run_id, "Watch cancelled");
            return None;
        }
        let Some(left) = state
            .deadline
            .and_then(|deadline| remaining(state.clock, deadline))
        else {
            info!(run_id = state.run_id, "Watch timed out before completion");
            return None;
        };

        let snapshot = match race(
            state.clock,
            left,
            &state.cancel,
            state.source.get_run(state.run_id),
        )
        .await
        {
            Raced::Done(snapshot) => snapshot,
            Raced::Cancelled => {
                info!(run_id = state.run_id, "Watch cancelled");
                return None;
            }
            Raced::TimedOut => {
                info!(run_id = state.run_id, "Run fetch still pending at the deadline");
                return None;
            }
        };
        match &snapshot {
            Ok(run) => {
                debug!(
                    run_id = run.id,
                    status = run.status.as_str(),
                    conclusion = run.conclusion.map(|c| c.as_str()),
                    "Run snapshot"
                );
                state.finished = run.is_completed();
            }
            Err(e) => warn!(run_id = state.run_id, error = %e, "Failed to fetch run"),
        }
        Some((snapshot, state))
    })
}

struct WatchState<'a, S, C> {
    source: &'a S,
    clock: &'a C,
    run_id: u64,
    timeout: Duration,
    poll_interval: Duration,
    cancel: CancellationToken,
    deadline: Option<Instant>,
    finished: bool,
}
