//! MCP Tool Handlers
//!
//! One handler per catalog entry. Each deserializes its (already validated)
//! arguments, calls the platform client and renders the outcome as text.
//! Failures are returned as [`Error`]; turning them into tool results is
//! the dispatcher's job.

use std::fmt::Write as _;
use std::sync::Arc;

use actions_client::{ActionsApi, Repository, Workflow, WorkflowRun};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::tools::ToolFuture;
use crate::{Error, Result};

fn parse_args<T: DeserializeOwned>(arguments: Value) -> Result<T> {
    serde_json::from_value(arguments).map_err(|e| Error::invalid_arguments(e.to_string()))
}

#[derive(Debug, Deserialize)]
struct OwnerArgs {
    owner: String,
}

#[derive(Debug, Deserialize)]
struct RepoArgs {
    owner: String,
    repo: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowArgs {
    owner: String,
    repo: String,
    workflow_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TriggerArgs {
    owner: String,
    repo: String,
    workflow_id: String,
    #[serde(rename = "ref")]
    git_ref: String,
    #[serde(default)]
    inputs: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunArgs {
    owner: String,
    repo: String,
    run_id: u64,
}

// ============================================================================
// Repositories
// ============================================================================

pub(crate) fn list_repositories(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: OwnerArgs = parse_args(arguments)?;
        let repositories = api.list_repositories(&args.owner).await?;

        if repositories.is_empty() {
            return Ok(format!("No repositories found for {}", args.owner));
        }
        let names: Vec<&str> = repositories.iter().map(|r| r.name.as_str()).collect();
        Ok(format!("Repositories for {}: {}", args.owner, names.join(", ")))
    })
}

pub(crate) fn get_repository(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RepoArgs = parse_args(arguments)?;
        let repository = api.get_repository(&args.owner, &args.repo).await?;
        Ok(format_repository(&repository))
    })
}

fn format_repository(repo: &Repository) -> String {
    let mut out = format!("Repository: {}\n", repo.full_name);
    let _ = writeln!(
        out,
        "Description: {}",
        repo.description.as_deref().unwrap_or("(none)")
    );
    let _ = writeln!(
        out,
        "Visibility: {}",
        if repo.private { "private" } else { "public" }
    );
    let _ = writeln!(
        out,
        "Default branch: {}",
        repo.default_branch.as_deref().unwrap_or("(unknown)")
    );
    let _ = writeln!(
        out,
        "Language: {}",
        repo.language.as_deref().unwrap_or("(unknown)")
    );
    let _ = writeln!(out, "Stars: {}", repo.stargazers_count);
    let _ = writeln!(out, "Forks: {}", repo.forks_count);
    let _ = writeln!(out, "Open issues: {}", repo.open_issues_count);
    let _ = write!(out, "URL: {}", repo.html_url);
    out
}

// ============================================================================
// Workflows
// ============================================================================

pub(crate) fn get_workflows(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RepoArgs = parse_args(arguments)?;
        let workflows = api.list_workflows(&args.owner, &args.repo).await?;

        if workflows.is_empty() {
            return Ok(format!("No workflows found in {}/{}", args.owner, args.repo));
        }
        let mut out = format!("Workflows in {}/{}:", args.owner, args.repo);
        for workflow in &workflows {
            let _ = write!(
                out,
                "\n- {} (id {}, {}, {})",
                workflow.name, workflow.id, workflow.path, workflow.state
            );
        }
        Ok(out)
    })
}

pub(crate) fn get_workflow(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: WorkflowArgs = parse_args(arguments)?;
        let workflow = api
            .get_workflow(&args.owner, &args.repo, &args.workflow_id)
            .await?;
        Ok(format_workflow(&workflow))
    })
}

fn format_workflow(workflow: &Workflow) -> String {
    let mut out = format!("Workflow: {}\n", workflow.name);
    let _ = writeln!(out, "ID: {}", workflow.id);
    let _ = writeln!(out, "Path: {}", workflow.path);
    let _ = write!(out, "State: {}", workflow.state);
    if let Some(url) = &workflow.html_url {
        let _ = write!(out, "\nURL: {}", url);
    }
    out
}

pub(crate) fn trigger_workflow(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: TriggerArgs = parse_args(arguments)?;
        api.trigger_workflow(
            &args.owner,
            &args.repo,
            &args.workflow_id,
            &args.git_ref,
            args.inputs,
        )
        .await?;
        Ok(format!(
            "Workflow {} triggered successfully on {}",
            args.workflow_id, args.git_ref
        ))
    })
}

// ============================================================================
// Workflow runs
// ============================================================================

pub(crate) fn list_workflow_runs(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: WorkflowArgs = parse_args(arguments)?;
        let runs = api
            .list_workflow_runs(&args.owner, &args.repo, &args.workflow_id)
            .await?;

        if runs.is_empty() {
            return Ok(format!(
                "No runs found for workflow {} in {}/{}",
                args.workflow_id, args.owner, args.repo
            ));
        }
        let mut out = format!(
            "Workflow runs for {} in {}/{}:",
            args.workflow_id, args.owner, args.repo
        );
        for run in &runs {
            let _ = write!(
                out,
                "\n- #{} id {}: {}/{} on {}",
                run.run_number,
                run.id,
                run.status.as_deref().unwrap_or("unknown"),
                run.conclusion.as_deref().unwrap_or("pending"),
                run.head_branch.as_deref().unwrap_or("(detached)")
            );
        }
        Ok(out)
    })
}

pub(crate) fn get_workflow_run(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RunArgs = parse_args(arguments)?;
        let run = api
            .get_workflow_run(&args.owner, &args.repo, args.run_id)
            .await?;
        Ok(format_run(&run))
    })
}

fn format_run(run: &WorkflowRun) -> String {
    let mut out = format!("Workflow run {} (#{})\n", run.id, run.run_number);
    if let Some(name) = &run.name {
        let _ = writeln!(out, "Workflow: {}", name);
    }
    let _ = writeln!(out, "Status: {}", run.status.as_deref().unwrap_or("unknown"));
    let _ = writeln!(
        out,
        "Conclusion: {}",
        run.conclusion.as_deref().unwrap_or("pending")
    );
    let _ = writeln!(out, "Event: {}", run.event);
    let _ = writeln!(
        out,
        "Branch: {}",
        run.head_branch.as_deref().unwrap_or("(detached)")
    );
    let _ = writeln!(out, "Commit: {}", run.head_sha);
    if let Some(created) = &run.created_at {
        let _ = writeln!(out, "Created: {}", created);
    }
    if let Some(updated) = &run.updated_at {
        let _ = writeln!(out, "Updated: {}", updated);
    }
    let _ = write!(out, "URL: {}", run.html_url);
    out
}

/// Text for operations that report a bare accepted/not-accepted flag.
fn outcome(accepted: bool, success: String, request: String) -> String {
    if accepted {
        success
    } else {
        format!(
            "{} was not accepted (remote returned an unexpected status)",
            request
        )
    }
}

pub(crate) fn cancel_workflow_run(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RunArgs = parse_args(arguments)?;
        let accepted = api
            .cancel_workflow_run(&args.owner, &args.repo, args.run_id)
            .await?;
        Ok(outcome(
            accepted,
            format!("Workflow run {} cancelled successfully", args.run_id),
            format!("Cancellation of workflow run {}", args.run_id),
        ))
    })
}

pub(crate) fn rerun_workflow(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RunArgs = parse_args(arguments)?;
        let created = api
            .rerun_workflow(&args.owner, &args.repo, args.run_id)
            .await?;
        Ok(outcome(
            created,
            format!("Workflow run {} re-run requested successfully", args.run_id),
            format!("Re-run of workflow run {}", args.run_id),
        ))
    })
}

pub(crate) fn delete_workflow_run(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RunArgs = parse_args(arguments)?;
        let deleted = api
            .delete_workflow_run(&args.owner, &args.repo, args.run_id)
            .await?;
        Ok(outcome(
            deleted,
            format!("Workflow run {} deleted successfully", args.run_id),
            format!("Deletion of workflow run {}", args.run_id),
        ))
    })
}

// ============================================================================
// Logs
// ============================================================================

pub(crate) fn get_workflow_run_logs(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RunArgs = parse_args(arguments)?;
        let logs = api
            .get_workflow_run_logs(&args.owner, &args.repo, args.run_id)
            .await?;
        if logs.is_empty() {
            return Ok(format!("No log files found for run {}", args.run_id));
        }
        Ok(logs)
    })
}

pub(crate) fn get_workflow_run_logs_url(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RunArgs = parse_args(arguments)?;
        let url = api
            .workflow_run_logs_url(&args.owner, &args.repo, args.run_id)
            .await?;
        Ok(format!("Logs for run {}: {}", args.run_id, url))
    })
}

pub(crate) fn delete_workflow_run_logs(api: Arc<dyn ActionsApi>, arguments: Value) -> ToolFuture {
    Box::pin(async move {
        let args: RunArgs = parse_args(arguments)?;
        let deleted = api
            .delete_workflow_run_logs(&args.owner, &args.repo, args.run_id)
            .await?;
        Ok(outcome(
            deleted,
            format!("Logs for workflow run {} deleted successfully", args.run_id),
            format!("Log deletion for workflow run {}", args.run_id),
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actions_test_utils::{StubActions, fixtures};
    use serde_json::json;

    fn stub() -> Arc<StubActions> {
        Arc::new(StubActions::new())
    }

    #[tokio::test]
    async fn test_list_repositories_joins_names() {
        let api = stub();
        let text = list_repositories(api.clone(), json!({ "owner": "acme" }))
            .await
            .unwrap();
        assert_eq!(text, "Repositories for acme: widgets, gadgets");
        assert_eq!(api.call_count_for("list_repositories"), 1);
    }

    #[tokio::test]
    async fn test_list_repositories_empty() {
        let api = Arc::new(StubActions::new().with_repositories(vec![]));
        let text = list_repositories(api, json!({ "owner": "acme" }))
            .await
            .unwrap();
        assert_eq!(text, "No repositories found for acme");
    }

    #[tokio::test]
    async fn test_get_repository_summary() {
        let text = get_repository(stub(), json!({ "owner": "acme", "repo": "widgets" }))
            .await
            .unwrap();
        assert!(text.starts_with("Repository: acme/widgets\n"));
        assert!(text.contains("Visibility: public"));
        assert!(text.contains("Default branch: main"));
        assert!(text.ends_with("URL: https://github.com/acme/widgets"));
    }

    #[tokio::test]
    async fn test_get_workflows_lists_each_workflow() {
        let text = get_workflows(stub(), json!({ "owner": "acme", "repo": "widgets" }))
            .await
            .unwrap();
        assert_eq!(
            text,
            "Workflows in acme/widgets:\n\
             - CI (id 161335, .github/workflows/ci.yml, active)\n\
             - Release (id 161336, .github/workflows/release.yml, active)"
        );
    }

    #[tokio::test]
    async fn test_list_workflow_runs_renders_pending_conclusion() {
        let api = Arc::new(
            StubActions::new().with_runs(vec![fixtures::workflow_run(7001, "queued", None)]),
        );
        let text = list_workflow_runs(
            api,
            json!({ "owner": "acme", "repo": "widgets", "workflowId": "ci.yml" }),
        )
        .await
        .unwrap();
        assert!(text.starts_with("Workflow runs for ci.yml in acme/widgets:"));
        assert!(text.contains("#1 id 7001: queued/pending on main"));
    }

    #[tokio::test]
    async fn test_get_workflow_run_summary() {
        let text = get_workflow_run(
            stub(),
            json!({ "owner": "acme", "repo": "widgets", "runId": 42 }),
        )
        .await
        .unwrap();
        assert!(text.starts_with("Workflow run 42 (#42)"));
        assert!(text.contains("Conclusion: success"));
    }

    #[tokio::test]
    async fn test_trigger_passes_inputs_through() {
        let api = stub();
        let text = trigger_workflow(
            api.clone(),
            json!({
                "owner": "acme",
                "repo": "widgets",
                "workflowId": "deploy.yml",
                "ref": "v1.2.0",
                "inputs": { "environment": "prod" }
            }),
        )
        .await
        .unwrap();
        assert_eq!(text, "Workflow deploy.yml triggered successfully on v1.2.0");

        let calls = api.calls();
        assert_eq!(calls[0].args, vec!["acme", "widgets", "deploy.yml", "v1.2.0"]);
        assert_eq!(
            calls[0].inputs.as_ref().unwrap()["environment"],
            json!("prod")
        );
    }

    #[tokio::test]
    async fn test_cancel_reports_acceptance() {
        let args = json!({ "owner": "acme", "repo": "widgets", "runId": 42 });

        let text = cancel_workflow_run(stub(), args.clone()).await.unwrap();
        assert_eq!(text, "Workflow run 42 cancelled successfully");

        let rejecting = Arc::new(StubActions::new().rejecting());
        let text = cancel_workflow_run(rejecting, args).await.unwrap();
        assert_eq!(
            text,
            "Cancellation of workflow run 42 was not accepted (remote returned an unexpected status)"
        );
    }

    #[tokio::test]
    async fn test_logs_url_text() {
        let text = get_workflow_run_logs_url(
            stub(),
            json!({ "owner": "acme", "repo": "widgets", "runId": 42 }),
        )
        .await
        .unwrap();
        assert!(text.starts_with("Logs for run 42: https://"));
    }

    #[tokio::test]
    async fn test_empty_log_archive() {
        let api = Arc::new(StubActions::new().with_log_archive(fixtures::log_archive(&[])));
        let text = get_workflow_run_logs(
            api,
            json!({ "owner": "acme", "repo": "widgets", "runId": 42 }),
        )
        .await
        .unwrap();
        assert_eq!(text, "No log files found for run 42");
    }

    #[tokio::test]
    async fn test_remote_failure_propagates() {
        let api = Arc::new(StubActions::new().failing(502, "Bad gateway"));
        let err = rerun_workflow(api, json!({ "owner": "acme", "repo": "widgets", "runId": 9 }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Client(_)));
        assert!(err.to_string().contains("Bad gateway"));
    }

    #[tokio::test]
    async fn test_wrong_shape_is_invalid_arguments() {
        let err = get_workflow_run(stub(), json!({ "owner": "acme", "repo": "widgets" }))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }
}
