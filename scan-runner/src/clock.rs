//! Time source for the polling loops.
//!
//! Polling code never calls `tokio::time` directly; it goes through a
//! [`Clock`] so tests can run whole timeout windows without waiting.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Monotonic time and sleeping.
pub trait Clock: Send + Sync {
    /// Current monotonic instant.
    fn now(&self) -> Instant;

    /// Suspends for `duration`.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Real time backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        tokio::time::sleep(duration)
    }
}

/// Virtual time: sleeping advances the clock immediately.
///
/// Cloning shares the same timeline.
#[derive(Debug, Clone)]
pub struct ManualClock {
    origin: Instant,
    state: Arc<Mutex<ManualState>>,
}

#[derive(Debug, Default)]
struct ManualState {
    elapsed: Duration,
    sleeps: Vec<Duration>,
}

impl ManualClock {
    /// Creates a clock starting at the current instant.
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Arc::new(Mutex::new(ManualState::default())),
        }
    }

    /// Moves the clock forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.lock().elapsed += duration;
    }

    /// Virtual time passed since creation.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.lock().elapsed
    }

    /// Every sleep requested so far, in order.
    #[must_use]
    pub fn sleeps(&self) -> Vec<Duration> {
        self.lock().sleeps.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ManualState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.lock().elapsed
    }

    /// Time moves when the returned future is first polled, so a sleep
    /// that loses a `select!` race leaves the clock untouched.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        let state = Arc::clone(&self.state);
        async move {
            let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
            state.elapsed += duration;
            state.sleeps.push(duration);
        }
    }
}

/// Sleeps for `duration` unless `cancel` fires first.
///
/// Returns true if cancelled.
pub(crate) async fn sleep_or_cancel<C: Clock>(
    clock: &C,
    duration: Duration,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => true,
        _ = clock.sleep(duration) => false,
    }
}

/// How a call raced against the deadline and the cancellation token ended.
#[derive(Debug)]
pub(crate) enum Raced<T> {
    /// The call finished first.
    Done(T),
    /// The token fired first.
    Cancelled,
    /// `limit` elapsed first.
    TimedOut,
}

/// Awaits `call` for at most `limit`, giving up early if `cancel` fires.
///
/// Polled in order: cancellation, then the call, then the timer.
pub(crate) async fn race<C, F>(
    clock: &C,
    limit: Duration,
    cancel: &CancellationToken,
    call: F,
) -> Raced<F::Output>
where
    C: Clock,
    F: Future,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Raced::Cancelled,
        output = call => Raced::Done(output),
        _ = clock.sleep(limit) => Raced::TimedOut,
    }
}

/// Time left before `deadline`, or `None` once it has passed.
pub(crate) fn remaining(clock: &impl Clock, deadline: Instant) -> Option<Duration> {
    let now = clock.now();
    (now < deadline).then(|| deadline - now)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_advances_on_sleep() {
        let clock = ManualClock::new();
        let start = clock.now();

        clock.sleep(Duration::from_millis(500)).await;
        clock.advance(Duration::from_secs(1));

        assert_eq!(clock.now() - start, Duration::from_millis(1500));
        assert_eq!(clock.sleeps(), vec![Duration::from_millis(500)]);
    }

    #[tokio::test]
    async fn cancelled_token_interrupts_sleep() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        assert!(sleep_or_cancel(&TokioClock, Duration::from_secs(3600), &cancel).await);
    }

    #[tokio::test]
    async fn sleep_that_is_never_polled_does_not_move_time() {
        let clock = ManualClock::new();
        drop(clock.sleep(Duration::from_secs(5)));
        assert_eq!(clock.elapsed(), Duration::ZERO);
        assert!(clock.sleeps().is_empty());
    }

    #[tokio::test]
    async fn race_prefers_a_ready_call() {
        let clock = ManualClock::new();
        let cancel = CancellationToken::new();

        let raced = race(&clock, Duration::from_secs(1), &cancel, async { 7 }).await;

        assert!(matches!(raced, Raced::Done(7)));
        assert_eq!(clock.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn race_times_out_a_stalled_call() {
        let clock = ManualClock::new();
        let cancel = CancellationToken::new();

        let raced = race(
            &clock,
            Duration::from_millis(750),
            &cancel,
            std::future::pending::<()>(),
        )
        .await;

        assert!(matches!(raced, Raced::TimedOut));
        assert_eq!(clock.elapsed(), Duration::from_millis(750));
    }

    #[tokio::test]
    async fn race_stops_a_stalled_call_on_cancel() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let raced = race(
            &TokioClock,
            Duration::from_secs(3600),
            &cancel,
            std::future::pending::<()>(),
        )
        .await;

        assert!(matches!(raced, Raced::Cancelled));
    }

    #[test]
    fn remaining_is_none_past_deadline() {
        let clock = ManualClock::new();
        let deadline = clock.now() + Duration::from_secs(2);
        assert_eq!(remaining(&clock, deadline), Some(Duration::from_secs(2)));
        clock.advance(Duration::from_secs(2));
        assert_eq!(remaining(&clock, deadline), None);
    }
}
