//! Dispatch tokens.

use serde::Serialize;
use std::fmt;

/// Prefix of generated tokens.
const GENERATED_PREFIX: &str = "ui-";

/// Number of hex characters in a generated token.
const GENERATED_HEX_LEN: usize = 8;

/// Opaque tag passed as the `client_run_id` input so the run can be found again.
///
/// The workflow embeds it in the run's display title. It only needs to be
/// unique among dispatches racing in the same correlation window; it is not
/// a secret.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DispatchToken(String);

impl DispatchToken {
    /// Generates a fresh `ui-xxxxxxxx` token.
    #[must_use]
    pub fn generate() -> Self {
        let hex = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("{GENERATED_PREFIX}{}", &hex[..GENERATED_HEX_LEN]))
    }

    /// Uses the caller's value when it is not blank, otherwise generates one.
    #[must_use]
    pub fn from_input(input: &str) -> Self {
        let input = input.trim();
        if input.is_empty() {
            Self::generate()
        } else {
            Self(input.to_string())
        }
    }

    /// Returns the token text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DispatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
