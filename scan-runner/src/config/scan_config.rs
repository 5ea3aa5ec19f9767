//! Validated scan configuration.

use super::error::ConfigError;
use super::file::{ConfigFile, CorrelationMode, PollingFile};
use crate::github::WorkflowTarget;
use crate::runs::{RunFilter, DISPATCH_EVENT};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Overrides the workflow file name from the config.
pub const WORKFLOW_ENV: &str = "SCAN_RUNNER_WORKFLOW";

/// Overrides the dispatch branch from the config.
pub const BRANCH_ENV: &str = "SCAN_RUNNER_BRANCH";

/// GitHub's maximum page size.
const MAX_PER_PAGE: u8 = 100;

/// Timeouts and intervals of the polling loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollingConfig {
    /// Bound for finding the dispatched run.
    pub find_timeout: Duration,

    /// Pause between run listings.
    pub find_interval: Duration,

    /// Bound for watching the run until completion.
    pub watch_timeout: Duration,

    /// Pause between run fetches.
    pub watch_interval: Duration,

    /// Page size of run listings.
    pub per_page: u8,
}

impl From<&PollingFile> for PollingConfig {
    fn from(file: &PollingFile) -> Self {
        Self {
            find_timeout: Duration::from_secs(file.find_timeout_secs),
            find_interval: Duration::from_secs(file.find_interval_secs),
            watch_timeout: Duration::from_secs(file.watch_timeout_secs),
            watch_interval: Duration::from_secs(file.watch_interval_secs),
            per_page: file.per_page,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self::from(&PollingFile::default())
    }
}

/// Everything needed to dispatch and track scans.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Workflow scans are dispatched to.
    pub target: WorkflowTarget,

    /// Hosts accepted for git scan targets.
    pub allowed_hosts: Vec<String>,

    /// How the dispatched run is identified.
    pub correlation: CorrelationMode,

    /// Polling timeouts and intervals.
    pub polling: PollingConfig,

    /// Scanner agent toggles.
    pub agents: BTreeMap<String, bool>,
}

impl ScanConfig {
    /// Loads, applies environment overrides to, and validates a config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is missing, unreadable, not valid
    /// TOML, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        debug!(path = %path.display(), "Loading scan config");

        if !path.exists() {
            return Err(ConfigError::MissingFile {
                path: path.display().to_string(),
            });
        }

        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.display().to_string(),
            source: e,
        })?;

        Self::parse(&contents, &path.display().to_string())
    }

    /// Parses config text; `path` is only used in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid TOML or fails validation.
    pub fn parse(contents: &str, path: &str) -> Result<Self, ConfigError> {
        let mut file: ConfigFile = toml::from_str(contents).map_err(|e| ConfigError::TomlError {
            path: path.to_string(),
            source: e,
        })?;

        apply_env_overrides(&mut file);
        validate(&file, path)?;

        Ok(Self {
            target: WorkflowTarget {
                owner: file.owner.trim().to_string(),
                repo: file.repo.trim().to_string(),
                workflow: file.workflow.trim().to_string(),
                branch: file.branch.trim().to_string(),
            },
            allowed_hosts: file
                .allowed_hosts
                .iter()
                .map(|host| host.trim().to_ascii_lowercase())
                .collect(),
            correlation: file.correlation,
            polling: PollingConfig::from(&file.polling),
            agents: file.agents,
        })
    }

    /// Listing filter for runs created by this config's dispatches.
    #[must_use]
    pub fn run_filter(&self) -> RunFilter {
        RunFilter {
            event: Some(DISPATCH_EVENT.to_string()),
            branch: Some(self.target.branch.clone()),
            per_page: self.polling.per_page,
        }
    }
}

/// Environment variables take precedence over the config file.
fn apply_env_overrides(file: &mut ConfigFile) {
    if let Some(workflow) = env_value(WORKFLOW_ENV) {
        debug!(workflow = %workflow, "Workflow overridden from environment");
        file.workflow = workflow;
    }
    if let Some(branch) = env_value(BRANCH_ENV) {
        debug!(branch = %branch, "Branch overridden from environment");
        file.branch = branch;
    }
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn validate(file: &ConfigFile, path: &str) -> Result<(), ConfigError> {
    let fail = |message: String| {
        Err(ConfigError::ValidationError {
            path: path.to_string(),
            message,
        })
    };

    for (field, value) in [
        ("owner", &file.owner),
        ("repo", &file.repo),
        ("workflow", &file.workflow),
        ("branch", &file.branch),
    ] {
        if value.trim().is_empty() {
            return fail(format!("{field} cannot be empty"));
        }
    }

    if file.allowed_hosts.iter().all(|host| host.trim().is_empty()) {
        return fail("allowed-hosts must name at least one host".to_string());
    }

    let polling = &file.polling;
    if polling.find_interval_secs == 0 || polling.watch_interval_secs == 0 {
        return fail("polling intervals must be at least one second".to_string());
    }
    if polling.find_interval_secs > polling.find_timeout_secs {
        return fail("find-interval-secs cannot exceed find-timeout-secs".to_string());
    }
    if polling.watch_interval_secs > polling.watch_timeout_secs {
        return fail("watch-interval-secs cannot exceed watch-timeout-secs".to_string());
    }
    if polling.per_page == 0 || polling.per_page > MAX_PER_PAGE {
        return fail(format!("per-page must be between 1 and {MAX_PER_PAGE}"));
    }

    Ok(())
}
