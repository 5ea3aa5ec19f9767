//! Raw `scan-runner.toml` contents.

use serde::Deserialize;
use std::collections::BTreeMap;

/// How the dispatched run is identified.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrelationMode {
    /// Match the dispatch token in the run's display title.
    #[default]
    Token,

    /// Take the newest run created after the dispatch; guesses on timeout.
    Timestamp,
}

/// Parsed `scan-runner.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct ConfigFile {
    /// Owner of the repository holding the scan workflow.
    pub owner: String,

    /// Repository holding the scan workflow.
    pub repo: String,

    /// Workflow file name.
    pub workflow: String,

    /// Branch to dispatch on (defaults to "main").
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Hosts accepted for git scan targets (defaults to `["github.com"]`).
    #[serde(default = "default_allowed_hosts")]
    pub allowed_hosts: Vec<String>,

    /// Run correlation mode (defaults to token).
    #[serde(default)]
    pub correlation: CorrelationMode,

    /// Polling timeouts and intervals.
    #[serde(default)]
    pub polling: PollingFile,

    /// Scanner agent toggles, sent as `agent_<name>` inputs.
    #[serde(default)]
    pub agents: BTreeMap<String, bool>,
}

/// `[polling]` table, all values in seconds.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct PollingFile {
    pub find_timeout_secs: u64,
    pub find_interval_secs: u64,
    pub watch_timeout_secs: u64,
    pub watch_interval_secs: u64,
    pub per_page: u8,
}

impl Default for PollingFile {
    fn default() -> Self {
        Self {
            find_timeout_secs: 90,
            find_interval_secs: 3,
            watch_timeout_secs: 600,
            watch_interval_secs: 5,
            per_page: crate::runs::DEFAULT_PER_PAGE,
        }
    }
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_allowed_hosts() -> Vec<String> {
    vec!["github.com".to_string()]
}
