//! The trait seam between the tool server and the platform.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::Result;
use crate::types::{Repository, Workflow, WorkflowRun};

/// Operations the tool server needs from the Actions platform.
///
/// [`crate::GitHubClient`] is the production implementation. Every call is a
/// fresh remote fetch; implementations must not retry on failure.
#[async_trait]
pub trait ActionsApi: Send + Sync {
    /// Fetch a single repository.
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository>;

    /// List repositories of a user or organization, in remote order.
    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>>;

    /// List the workflows defined in a repository.
    async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>>;

    /// Fetch a workflow by numeric id or file name (`ci.yml`).
    async fn get_workflow(&self, owner: &str, repo: &str, workflow_id: &str) -> Result<Workflow>;

    /// Dispatch a new run of a workflow on `git_ref`.
    ///
    /// `inputs` is forwarded verbatim when present.
    async fn trigger_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: &str,
        git_ref: &str,
        inputs: Option<Map<String, Value>>,
    ) -> Result<()>;

    /// List runs of a workflow.
    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: &str,
    ) -> Result<Vec<WorkflowRun>>;

    /// Fetch a single run.
    async fn get_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<WorkflowRun>;

    /// Request cancellation. `true` only when the remote accepted it (202).
    async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool>;

    /// Re-run a run. `true` only when the remote created the re-run (201).
    async fn rerun_workflow(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool>;

    /// Delete a run. `true` only on 204.
    async fn delete_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool>;

    /// Short-lived download location of the run's log archive.
    async fn workflow_run_logs_url(&self, owner: &str, repo: &str, run_id: u64) -> Result<String>;

    /// Download the run's log archive and combine every file into one string.
    ///
    /// See [`crate::extract_log_archive`] for the output layout.
    async fn get_workflow_run_logs(&self, owner: &str, repo: &str, run_id: u64)
    -> Result<String>;

    /// Delete the stored logs of a run. `true` only on 204.
    async fn delete_workflow_run_logs(&self, owner: &str, repo: &str, run_id: u64)
    -> Result<bool>;
}
