//! Normalized repository reference.

use bstr::ByteSlice;
use serde::Serialize;

/// Ref used when neither the caller nor the URL names one.
pub const DEFAULT_REF: &str = "main";

/// A pasted repository URL normalized into a clone URL and a ref.
///
/// Constructed by [`resolve`](super::resolve); immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReference {
    /// Input exactly as pasted by the caller.
    pub raw_input: String,

    /// Host the URL points at, lowercased, with a non-default port kept as
    /// `host:port`. `None` when unparsed.
    pub host: Option<String>,

    /// Repository owner (user or organization).
    pub owner: Option<String>,

    /// Repository name, without a `.git` suffix.
    pub name: Option<String>,

    /// Ref embedded in the URL path after a `tree`, `commit` or `releases/tag` marker.
    pub detected_ref: Option<String>,

    /// `https://<host>/<owner>/<name>.git` when parsed, the trimmed input otherwise.
    pub canonical_url: String,

    /// Explicit ref, else detected ref, else [`DEFAULT_REF`]. Never empty.
    pub resolved_ref: String,
}

impl RepositoryReference {
    /// Returns true if an owner/name pair was recognized.
    #[must_use]
    pub fn is_parsed(&self) -> bool {
        self.owner.is_some() && self.name.is_some()
    }

    /// Returns true if the resolved ref came from the URL rather than the caller or the default.
    #[must_use]
    pub fn ref_detected_from_url(&self) -> bool {
        self.detected_ref.as_deref() == Some(self.resolved_ref.as_str())
    }

    /// Returns `owner/name` when parsed.
    #[must_use]
    pub fn full_name(&self) -> Option<String> {
        match (&self.owner, &self.name) {
            (Some(owner), Some(name)) => Some(format!("{owner}/{name}")),
            _ => None,
        }
    }

    /// Returns true if the reference was parsed and points at `host`.
    #[must_use]
    pub fn is_hosted_on(&self, host: &str) -> bool {
        self.is_parsed()
            && self
                .host
                .as_deref()
                .is_some_and(|h| h.eq_ignore_ascii_case(host))
    }

    /// Checks the resolved ref against git ref-name rules.
    ///
    /// # Errors
    ///
    /// Returns the validation message when the ref could not name a branch, tag or commit.
    pub fn validate_ref(&self) -> Result<(), String> {
        gix_validate::reference::name_partial(self.resolved_ref.as_bytes().as_bstr())
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}
