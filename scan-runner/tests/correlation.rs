mod common;

use common::{epoch, run, ScriptedSource, StalledSource};
use scan_runner::{
    find_run, CancellationToken, CorrelationOutcome, CorrelationRequest, ManualClock,
    MatchPolicy, RunFilter, RunSourceError,
};
use std::time::Duration;

fn request(policy: MatchPolicy, timeout_ms: u64, interval_ms: u64) -> CorrelationRequest {
    CorrelationRequest {
        policy,
        filter: RunFilter::default(),
        timeout: Duration::from_millis(timeout_ms),
        poll_interval: Duration::from_millis(interval_ms),
    }
}

fn token(value: &str) -> MatchPolicy {
    MatchPolicy::Token(value.to_string())
}

#[tokio::test]
async fn token_match_on_nth_listing_stops_polling() {
    let source = ScriptedSource::new().with_lists(vec![
        Ok(vec![]),
        Ok(vec![run(1, "scan ui-0001", 0)]),
        Ok(vec![run(2, "build-ui-7f3a", 3), run(1, "scan ui-0001", 0)]),
        Ok(vec![run(3, "build-ui-7f3a again", 6)]),
    ]);
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(token("7f3a"), 60_000, 3_000),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.outcome.run().map(|r| r.id), Some(2));
    assert!(matches!(correlation.outcome, CorrelationOutcome::Found(_)));
    assert_eq!(correlation.attempts, 3);
    assert_eq!(source.list_calls(), 3);
    assert_eq!(clock.sleeps(), vec![Duration::from_secs(3); 2]);
}

#[tokio::test]
async fn empty_listing_times_out_as_not_found() {
    let source = ScriptedSource::new();
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(token("7f3a"), 2_000, 500),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::NotFound);
    assert_eq!(correlation.attempts, 4);
    assert_eq!(source.list_calls(), 4);
    assert!(clock.elapsed() <= Duration::from_millis(2_500));
}

#[tokio::test]
async fn sleeps_are_clamped_to_the_deadline() {
    let source = ScriptedSource::new();
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(token("x"), 1_000, 400),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.attempts, 3);
    assert_eq!(
        clock.sleeps(),
        vec![
            Duration::from_millis(400),
            Duration::from_millis(400),
            Duration::from_millis(200),
        ]
    );
    assert_eq!(clock.elapsed(), Duration::from_secs(1));
}

#[tokio::test]
async fn token_policy_never_guesses() {
    let source = ScriptedSource::new().with_lists(vec![Ok(vec![run(1, "unrelated", 0)])]);
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(token("7f3a"), 1_000, 500),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::NotFound);
}

#[tokio::test]
async fn failed_listings_do_not_abort_polling() {
    let source = ScriptedSource::new().with_lists(vec![
        Err(RunSourceError::RateLimitExceeded { reset_at: 0 }),
        Err(RunSourceError::RateLimitExceeded { reset_at: 0 }),
        Ok(vec![run(9, "scan ui-7f3a", 0)]),
    ]);
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(token("ui-7f3a"), 60_000, 1_000),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.outcome.run().map(|r| r.id), Some(9));
    assert_eq!(correlation.attempts, 3);
    assert_eq!(correlation.transient_failures, 2);
}

#[tokio::test]
async fn timestamp_policy_prefers_newest_run_after_dispatch() {
    // Dispatched at +100s; 97s is inside the skew tolerance, 50s is not.
    let source = ScriptedSource::new().with_lists(vec![
        Ok(vec![run(1, "old", 50)]),
        Ok(vec![run(3, "c", 104), run(2, "b", 97), run(1, "old", 50)]),
    ]);
    let clock = ManualClock::new();
    let since = epoch() + chrono::TimeDelta::seconds(100);

    let correlation = find_run(
        &source,
        &clock,
        &request(MatchPolicy::Since(since), 20_000, 2_000),
        &CancellationToken::new(),
    )
    .await;

    assert!(matches!(correlation.outcome, CorrelationOutcome::Found(ref r) if r.id == 3));
    assert_eq!(correlation.attempts, 2);
}

#[tokio::test]
async fn timestamp_policy_falls_back_to_most_recent_run() {
    let source = ScriptedSource::new().with_lists(vec![
        Ok(vec![run(5, "e", 20), run(4, "d", 10)]),
        Ok(vec![run(6, "f", 30), run(5, "e", 20)]),
    ]);
    let clock = ManualClock::new();
    let since = epoch() + chrono::TimeDelta::seconds(1_000);

    let correlation = find_run(
        &source,
        &clock,
        &request(MatchPolicy::Since(since), 3_000, 1_000),
        &CancellationToken::new(),
    )
    .await;

    // Later empty pages do not erase what was seen.
    assert!(matches!(correlation.outcome, CorrelationOutcome::BestGuess(ref r) if r.id == 6));
    assert_eq!(correlation.attempts, 3);
}

#[tokio::test]
async fn timestamp_policy_without_any_run_is_not_found() {
    let source = ScriptedSource::new();
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(MatchPolicy::Since(epoch()), 2_000, 1_000),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::NotFound);
}

#[tokio::test]
async fn cancelled_before_start_makes_no_calls() {
    let source = ScriptedSource::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let correlation = find_run(
        &source,
        &ManualClock::new(),
        &request(token("x"), 10_000, 1_000),
        &cancel,
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::Cancelled);
    assert_eq!(correlation.attempts, 0);
    assert_eq!(source.list_calls(), 0);
}

#[tokio::test]
async fn cancellation_mid_poll_stops_the_loop() {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    let source = ScriptedSource::new().on_list(move |call| {
        if call == 2 {
            trigger.cancel();
        }
    });

    let correlation = find_run(
        &source,
        &ManualClock::new(),
        &request(token("x"), 60_000, 1_000),
        &cancel,
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::Cancelled);
    assert_eq!(source.list_calls(), 2);
}

#[tokio::test]
async fn exhausted_quota_is_retried_within_the_deadline() {
    // Every listing reports the quota as spent, as the GitHub source does
    // until the window resets.
    let source = ScriptedSource::new().with_lists(
        (0..10)
            .map(|_| Err(RunSourceError::RateLimitExceeded { reset_at: u64::MAX }))
            .collect(),
    );
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(token("7f3a"), 1_000, 500),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::NotFound);
    assert_eq!(correlation.attempts, 2);
    assert_eq!(correlation.transient_failures, 2);
    assert_eq!(clock.elapsed(), Duration::from_secs(1));
}

#[tokio::test]
async fn hung_listing_ends_at_the_deadline() {
    let source = StalledSource::default();
    let clock = ManualClock::new();

    let correlation = find_run(
        &source,
        &clock,
        &request(MatchPolicy::Since(epoch()), 1_000, 400),
        &CancellationToken::new(),
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::NotFound);
    assert_eq!(correlation.attempts, 1);
    assert_eq!(source.calls(), 1);
    assert_eq!(clock.elapsed(), Duration::from_secs(1));
}

#[tokio::test]
async fn hung_listing_is_abandoned_on_cancel() {
    let source = StalledSource::default();
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let correlation = find_run(
        &source,
        &scan_runner::TokioClock,
        &request(token("x"), 60_000, 1_000),
        &cancel,
    )
    .await;

    assert_eq!(correlation.outcome, CorrelationOutcome::Cancelled);
    assert_eq!(source.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(5));
}
