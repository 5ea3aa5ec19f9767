#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use scan_runner::{
    Artifact, DispatchError, Dispatcher, RunConclusion, RunFilter, RunHandle, RunSource,
    RunSourceError, RunStatus,
};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Fixed reference instant; run creation times are offsets from it.
pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap()
}

pub fn run(id: u64, title: &str, created_offset_secs: i64) -> RunHandle {
    RunHandle {
        id,
        created_at: epoch() + chrono::TimeDelta::seconds(created_offset_secs),
        status: RunStatus::Queued,
        conclusion: None,
        display_title: title.to_string(),
        html_url: format!("https://github.com/acme/scans/actions/runs/{id}"),
    }
}

pub fn snapshot(id: u64, status: RunStatus, conclusion: Option<RunConclusion>) -> RunHandle {
    RunHandle {
        status,
        conclusion,
        ..run(id, "scan ui-7f3a", 0)
    }
}

/// Run source that replays scripted responses and counts calls.
///
/// Once a script runs out, listings return an empty page and fetches
/// repeat the fallback run (or report it missing).
#[derive(Default)]
pub struct ScriptedSource {
    lists: Mutex<VecDeque<Result<Vec<RunHandle>, RunSourceError>>>,
    runs: Mutex<VecDeque<Result<RunHandle, RunSourceError>>>,
    fallback_run: Option<RunHandle>,
    artifacts: Vec<Artifact>,
    list_calls: AtomicUsize,
    get_calls: AtomicUsize,
    artifact_calls: AtomicUsize,
    on_list: Option<Box<dyn Fn(usize) + Send + Sync>>,
    rejection: Option<(u16, String)>,
    dispatched: Mutex<Vec<BTreeMap<String, String>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lists(self, lists: Vec<Result<Vec<RunHandle>, RunSourceError>>) -> Self {
        *self.lists.lock().unwrap() = lists.into();
        self
    }

    pub fn with_runs(self, runs: Vec<Result<RunHandle, RunSourceError>>) -> Self {
        *self.runs.lock().unwrap() = runs.into();
        self
    }

    pub fn repeating_run(mut self, run: RunHandle) -> Self {
        self.fallback_run = Some(run);
        self
    }

    pub fn with_artifacts(mut self, artifacts: Vec<Artifact>) -> Self {
        self.artifacts = artifacts;
        self
    }

    /// Answers every dispatch with an HTTP error.
    pub fn rejecting(mut self, status: u16, body: &str) -> Self {
        self.rejection = Some((status, body.to_string()));
        self
    }

    /// Calls `hook` with the 1-based call number on every listing.
    pub fn on_list(mut self, hook: impl Fn(usize) + Send + Sync + 'static) -> Self {
        self.on_list = Some(Box::new(hook));
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn get_calls(&self) -> usize {
        self.get_calls.load(Ordering::SeqCst)
    }

    pub fn artifact_calls(&self) -> usize {
        self.artifact_calls.load(Ordering::SeqCst)
    }

    /// Inputs of every dispatch attempted so far.
    pub fn dispatched(&self) -> Vec<BTreeMap<String, String>> {
        self.dispatched.lock().unwrap().clone()
    }
}

impl Dispatcher for ScriptedSource {
    fn workflow(&self) -> &str {
        "scan.yml"
    }

    async fn dispatch(&self, inputs: &BTreeMap<String, String>) -> Result<(), DispatchError> {
        self.dispatched.lock().unwrap().push(inputs.clone());
        match &self.rejection {
            Some((status, body)) => Err(DispatchError::Rejected {
                status: *status,
                body: body.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl RunSource for ScriptedSource {
    async fn list_runs(&self, _filter: &RunFilter) -> Result<Vec<RunHandle>, RunSourceError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(hook) = &self.on_list {
            hook(call);
        }
        let next = self.lists.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn get_run(&self, run_id: u64) -> Result<RunHandle, RunSourceError> {
        self.get_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.runs.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            self.fallback_run
                .clone()
                .ok_or(RunSourceError::RunNotFound { run_id })
        })
    }

    async fn list_artifacts(&self, _run_id: u64) -> Result<Vec<Artifact>, RunSourceError> {
        self.artifact_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.artifacts.clone())
    }
}

/// Run source whose calls never answer, like a request with no timeout.
#[derive(Default)]
pub struct StalledSource {
    calls: AtomicUsize,
}

impl StalledSource {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn stall<T>(&self) -> T {
        self.calls.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}

impl RunSource for StalledSource {
    async fn list_runs(&self, _filter: &RunFilter) -> Result<Vec<RunHandle>, RunSourceError> {
        self.stall().await
    }

    async fn get_run(&self, _run_id: u64) -> Result<RunHandle, RunSourceError> {
        self.stall().await
    }

    async fn list_artifacts(&self, _run_id: u64) -> Result<Vec<Artifact>, RunSourceError> {
        self.stall().await
    }
}
