//! Rate limiting for GitHub core API calls.
//!
//! Polling loops call the core API every few seconds, so every call checks
//! the remaining quota first. Low quota is reported as
//! [`RunSourceError::RateLimitExceeded`] rather than slept through here: the
//! polling loops own the deadline and the cancellation token, and treat the
//! error as a failed attempt.

use crate::runs::RunSourceError;
use octocrab::Octocrab;
use tracing::info;

/// Minimum remaining requests before calls are held back.
const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Rate limit information for the core API.
#[derive(Debug, Clone)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,
    /// Unix timestamp when the rate limit resets.
    pub reset: u64,
    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// Returns true if quota is low and the window has not reset yet.
    #[must_use]
    pub fn is_exhausted(&self, now_secs: u64) -> bool {
        self.remaining < MIN_REMAINING_THRESHOLD && self.reset > now_secs
    }
}

/// Checks the current rate limit status for the core API.
///
/// # Errors
///
/// Returns an error if the rate limit API call fails.
pub async fn check_core_rate_limit(octocrab: &Octocrab) -> Result<RateLimitInfo, octocrab::Error> {
    let rate_limit = octocrab.ratelimit().get().await?;
    let core = &rate_limit.resources.core;

    Ok(RateLimitInfo {
        remaining: core.remaining as u32,
        reset: core.reset,
        limit: core.limit as u32,
    })
}

/// Ensures there is core quota left. Never sleeps.
///
/// # Errors
///
/// Returns an error if the check fails, or
/// [`RunSourceError::RateLimitExceeded`] until the window resets.
pub async fn ensure_core_rate_limit(octocrab: &Octocrab) -> Result<(), RunSourceError> {
    let info = check_core_rate_limit(octocrab).await?;
    let now = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();

    if info.is_exhausted(now) {
        info!(
            remaining = info.remaining,
            limit = info.limit,
            wait_secs = info.reset - now,
            "Rate limit low, holding calls until reset"
        );
        return Err(RunSourceError::RateLimitExceeded {
            reset_at: info.reset,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(remaining: u32, reset: u64) -> RateLimitInfo {
        RateLimitInfo {
            remaining,
            reset,
            limit: 5000,
        }
    }

    #[test]
    fn not_exhausted_with_quota_left() {
        assert!(!info(100, 2_000).is_exhausted(1_000));
    }

    #[test]
    fn not_exhausted_once_reset_passed() {
        assert!(!info(1, 500).is_exhausted(1_000));
        assert!(!info(0, 1_000).is_exhausted(1_000));
    }

    #[test]
    fn exhausted_even_when_reset_is_close() {
        // A reset four seconds away is still reported, never waited out here.
        assert!(info(0, 1_004).is_exhausted(1_000));
        assert!(info(4, 4_600).is_exhausted(1_000));
    }
}
