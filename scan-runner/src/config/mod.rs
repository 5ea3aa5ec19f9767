//! Scan configuration loading.
//!
//! This module handles parsing `scan-runner.toml`, applying environment
//! overrides and validating the result.

mod error;
mod file;
mod scan_config;

pub use error::ConfigError;
pub use file::CorrelationMode;
pub use scan_config::{PollingConfig, ScanConfig, BRANCH_ENV, WORKFLOW_ENV};
