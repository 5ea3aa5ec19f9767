//! Rules for picking the dispatched run out of a listing.

use crate::runs::RunHandle;
use chrono::{DateTime, TimeDelta, Utc};
use std::fmt;

/// Slack applied to [`MatchPolicy::Since`] for clock skew between the
/// local dispatch time and the remote run creation time.
pub const SINCE_TOLERANCE: TimeDelta = TimeDelta::seconds(5);

/// How a dispatch is recognized among the listed runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchPolicy {
    /// The run whose display title contains this token.
    Token(String),

    /// The newest run created at or after this instant, minus [`SINCE_TOLERANCE`].
    ///
    /// Weak identification: concurrent dispatches can be confused.
    /// On timeout, falls back to the newest run seen.
    Since(DateTime<Utc>),
}

impl MatchPolicy {
    /// Picks the matching run from one listing, if any.
    ///
    /// An empty token matches nothing.
    pub fn select<'a>(&self, runs: &'a [RunHandle]) -> Option<&'a RunHandle> {
        match self {
            Self::Token(token) if token.is_empty() => None,
            Self::Token(token) => runs
                .iter()
                .find(|run| run.display_title.contains(token.as_str())),
            Self::Since(since) => {
                let bound = since
                    .checked_sub_signed(SINCE_TOLERANCE)
                    .unwrap_or(DateTime::<Utc>::MIN_UTC);
                runs.iter()
                    .filter(|run| run.created_at >= bound)
                    .max_by_key(|run| run.created_at)
            }
        }
    }

    /// Picks the fallback run once the deadline passed.
    ///
    /// Only the timestamp policy guesses; a token either matches or it doesn't.
    pub fn best_guess<'a>(&self, last_page: &'a [RunHandle]) -> Option<&'a RunHandle> {
        match self {
            Self::Token(_) => None,
            Self::Since(_) => last_page.iter().max_by_key(|run| run.created_at),
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => write!(f, "token:{token}"),
            Self::Since(since) => write!(f, "since:{}", since.to_rfc3339()),
        }
    }
}
