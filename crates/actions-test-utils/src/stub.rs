//! [`StubActions`], a recording stand-in for the Actions platform.

use std::sync::{Arc, Mutex};

use actions_client::{ActionsApi, Error, Repository, Result, Workflow, WorkflowRun};
use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::sync::Notify;

use crate::fixtures;

/// One call observed by the stub.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// Trait method name, e.g. `trigger_workflow`
    pub operation: &'static str,
    /// Positional string arguments in call order
    pub args: Vec<String>,
    /// Dispatch inputs (only set by `trigger_workflow`)
    pub inputs: Option<Map<String, Value>>,
}

/// In-memory [`ActionsApi`] that records every call.
///
/// By default every operation succeeds with the canned data from
/// [`crate::fixtures`]. Use [`StubActions::failing`] to make every call
/// return a remote error, and [`StubActions::rejecting`] to make the
/// status-code operations (cancel, rerun, delete) report `false`.
/// [`StubActions::gated`] holds every call open until the test releases it.
///
/// # Example
///
/// ```rust,no_run
/// use actions_test_utils::StubActions;
///
/// let stub = StubActions::new().failing(500, "boom");
/// assert_eq!(stub.call_count(), 0);
/// ```
pub struct StubActions {
    calls: Mutex<Vec<RecordedCall>>,
    failure: Option<(u16, String)>,
    accept: bool,
    repositories: Vec<Repository>,
    workflows: Vec<Workflow>,
    runs: Vec<WorkflowRun>,
    log_archive: Vec<u8>,
    gate: Option<Arc<Notify>>,
}

impl Default for StubActions {
    fn default() -> Self {
        Self::new()
    }
}

impl StubActions {
    /// A stub where every operation succeeds.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failure: None,
            accept: true,
            repositories: vec![
                fixtures::repository("acme", "widgets"),
                fixtures::repository("acme", "gadgets"),
            ],
            workflows: vec![
                fixtures::workflow(161335, "CI", "ci.yml"),
                fixtures::workflow(161336, "Release", "release.yml"),
            ],
            runs: vec![
                fixtures::workflow_run(30433642, "completed", Some("success")),
                fixtures::workflow_run(30433643, "in_progress", None),
            ],
            log_archive: fixtures::log_archive(&[("a.txt", "hello"), ("b.txt", "world")]),
            gate: None,
        }
    }

    /// Make every call fail with a remote error.
    pub fn failing(mut self, status: u16, message: impl Into<String>) -> Self {
        self.failure = Some((status, message.into()));
        self
    }

    /// Make cancel, rerun and delete report an unexpected success status.
    pub fn rejecting(mut self) -> Self {
        self.accept = false;
        self
    }

    /// Block every call, after it is recorded, until `gate` is notified.
    ///
    /// Each notification releases one waiting call.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Replace the repositories returned by `list_repositories`.
    pub fn with_repositories(mut self, repositories: Vec<Repository>) -> Self {
        self.repositories = repositories;
        self
    }

    /// Replace the runs returned by `list_workflow_runs`.
    pub fn with_runs(mut self, runs: Vec<WorkflowRun>) -> Self {
        self.runs = runs;
        self
    }

    /// Replace the archive served by `get_workflow_run_logs`.
    pub fn with_log_archive(mut self, archive: Vec<u8>) -> Self {
        self.log_archive = archive;
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("stub call log poisoned").clone()
    }

    /// Total number of calls.
    pub fn call_count(&self) -> usize {
        self.calls.lock().expect("stub call log poisoned").len()
    }

    /// Number of calls to one operation.
    pub fn call_count_for(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .expect("stub call log poisoned")
            .iter()
            .filter(|call| call.operation == operation)
            .count()
    }

    async fn record(
        &self,
        operation: &'static str,
        args: &[&str],
        inputs: Option<Map<String, Value>>,
    ) -> Result<()> {
        self.calls
            .lock()
            .expect("stub call log poisoned")
            .push(RecordedCall {
                operation,
                args: args.iter().map(|a| a.to_string()).collect(),
                inputs,
            });

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        match &self.failure {
            Some((status, message)) => Err(Error::Remote {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ActionsApi for StubActions {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        self.record("get_repository", &[owner, repo], None).await?;
        Ok(fixtures::repository(owner, repo))
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        self.record("list_repositories", &[owner], None).await?;
        Ok(self.repositories.clone())
    }

    async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>> {
        self.record("list_workflows", &[owner, repo], None).await?;
        Ok(self.workflows.clone())
    }

    async fn get_workflow(&self, owner: &str, repo: &str, workflow_id: &str) -> Result<Workflow> {
        self.record("get_workflow", &[owner, repo, workflow_id], None).await?;
        Ok(fixtures::workflow(161335, "CI", workflow_id))
    }

    async fn trigger_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: &str,
        git_ref: &str,
        inputs: Option<Map<String, Value>>,
    ) -> Result<()> {
        self.record(
            "trigger_workflow",
            &[owner, repo, workflow_id, git_ref],
            inputs,
        )
        .await
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: &str,
    ) -> Result<Vec<WorkflowRun>> {
        self.record("list_workflow_runs", &[owner, repo, workflow_id], None).await?;
        Ok(self.runs.clone())
    }

    async fn get_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<WorkflowRun> {
        self.record("get_workflow_run", &[owner, repo, &run_id.to_string()], None).await?;
        Ok(fixtures::workflow_run(run_id, "completed", Some("success")))
    }

    async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool> {
        self.record("cancel_workflow_run", &[owner, repo, &run_id.to_string()], None).await?;
        Ok(self.accept)
    }

    async fn rerun_workflow(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool> {
        self.record("rerun_workflow", &[owner, repo, &run_id.to_string()], None).await?;
        Ok(self.accept)
    }

    async fn delete_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool> {
        self.record("delete_workflow_run", &[owner, repo, &run_id.to_string()], None).await?;
        Ok(self.accept)
    }

    async fn workflow_run_logs_url(&self, owner: &str, repo: &str, run_id: u64) -> Result<String> {
        self.record("workflow_run_logs_url", &[owner, repo, &run_id.to_string()], None).await?;
        Ok(format!(
            "https://pipelines.actions.example.com/{}/{}/runs/{}/logs.zip",
            owner, repo, run_id
        ))
    }

    async fn get_workflow_run_logs(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<String> {
        self.record("get_workflow_run_logs", &[owner, repo, &run_id.to_string()], None).await?;
        actions_client::extract_log_archive(&self.log_archive)
    }

    async fn delete_workflow_run_logs(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<bool> {
        self.record("delete_workflow_run_logs", &[owner, repo, &run_id.to_string()], None).await?;
        Ok(self.accept)
    }
}
