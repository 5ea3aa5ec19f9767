//! Triggering the scan workflow.

mod error;
mod token;

pub use error::DispatchError;
pub use token::DispatchToken;

use crate::target::ScanTarget;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::future::Future;
use tracing::{info, info_span, Instrument};

/// Something that can trigger the scan workflow.
pub trait Dispatcher {
    /// Workflow file the dispatch goes to, for logging.
    fn workflow(&self) -> &str;

    /// Triggers the workflow with `inputs`. Sent once; never retried.
    fn dispatch(
        &self,
        inputs: &BTreeMap<String, String>,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Record of a dispatch that GitHub accepted.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchReceipt {
    /// Token sent as `client_run_id`.
    pub token: DispatchToken,

    /// Inputs sent with the dispatch.
    pub inputs: BTreeMap<String, String>,

    /// Local time just before the dispatch request was sent.
    pub dispatched_at: DateTime<Utc>,
}

/// Dispatches the scan workflow for `target` once.
///
/// # Arguments
///
/// * `dispatcher` - Client bound to the scan workflow
/// * `target` - What to scan
/// * `token` - Correlation token, sent as `client_run_id`
/// * `agents` - Scanner agent toggles, sent as `agent_<name>` inputs
///
/// # Errors
///
/// Returns [`DispatchError::Rejected`] with the status and body if GitHub
/// refuses the dispatch. The caller must not retry blindly.
pub async fn dispatch_scan<D: Dispatcher>(
    dispatcher: &D,
    target: &ScanTarget,
    token: DispatchToken,
    agents: &BTreeMap<String, bool>,
) -> Result<DispatchReceipt, DispatchError> {
    let span = info_span!(
        "dispatch",
        workflow = dispatcher.workflow(),
        scan_type = target.scan_type(),
        token = %token
    );

    async {
        let inputs = target.workflow_inputs(token.as_str(), agents);
        let dispatched_at = Utc::now();
        dispatcher.dispatch(&inputs).await?;
        info!(%dispatched_at, "Workflow dispatched");

        Ok(DispatchReceipt {
            token,
            inputs,
            dispatched_at,
        })
    }
    .instrument(span)
    .await
}
