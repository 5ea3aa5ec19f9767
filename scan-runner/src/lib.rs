#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod clock;
pub mod completion;
pub mod config;
pub mod correlation;
pub mod dispatch;
pub mod github;
pub mod rate_limit;
pub mod reference;
pub mod runner;
pub mod runs;
pub mod summary;
pub mod target;

pub use clock::{Clock, ManualClock, TokioClock};
pub use completion::watch_run;
pub use config::{ConfigError, CorrelationMode, PollingConfig, ScanConfig};
pub use correlation::{
    find_run, Correlation, CorrelationOutcome, CorrelationRequest, MatchPolicy, SINCE_TOLERANCE,
};
pub use dispatch::{dispatch_scan, DispatchError, DispatchReceipt, DispatchToken, Dispatcher};
pub use github::{DownloadError, GitHubClient, RefCatalog, RefChoice, RefKind, WorkflowTarget};
pub use rate_limit::{check_core_rate_limit, ensure_core_rate_limit, RateLimitInfo};
pub use reference::{resolve, RepositoryReference, DEFAULT_REF};
pub use runner::{Runner, RunnerError};
pub use runs::{
    Artifact, ArtifactReport, RunConclusion, RunFilter, RunHandle, RunSource, RunSourceError,
    RunStatus,
};
pub use summary::ScanSummary;
pub use target::{sanitize_tag, ArchiveFormat, ScanTarget, TargetError};
pub use tokio_util::sync::CancellationToken;
