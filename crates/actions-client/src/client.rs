//! reqwest-backed implementation of [`ActionsApi`].

use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderName, HeaderValue, LOCATION};
use reqwest::{Method, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};

use crate::api::ActionsApi;
use crate::config::{ClientConfig, DeploymentKind};
use crate::error::{Error, Result};
use crate::logs::extract_log_archive;
use crate::types::{Repository, Workflow, WorkflowList, WorkflowRun, WorkflowRunList};

const API_VERSION: &str = "2022-11-28";
const PAGE_SIZE: &str = "100";

/// Authenticated client for the Actions REST API.
///
/// Redirects are never followed automatically so the access token cannot
/// leak to the storage host that serves log archives.
pub struct GitHubClient {
    http: reqwest::Client,
    base: Url,
    token: String,
    deployment: DeploymentKind,
}

impl GitHubClient {
    /// Build a client from a validated configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        config.validate()?;

        let base = Url::parse(config.api_url())
            .map_err(|e| Error::config(format!("invalid API URL '{}': {}", config.api_url(), e)))?;
        if base.cannot_be_a_base() {
            return Err(Error::config(format!(
                "API URL '{}' cannot be used as a base",
                config.api_url()
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );
        headers.insert(
            HeaderName::from_static("x-github-api-version"),
            HeaderValue::from_static(API_VERSION),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("actions-mcp/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::none())
            .timeout(config.request_timeout)
            .build()?;

        tracing::debug!(deployment = %config.deployment, base = %base, "Created Actions API client");

        Ok(Self {
            http,
            base,
            token: config.token.clone(),
            deployment: config.deployment,
        })
    }

    /// API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Deployment kind the client was configured for.
    pub fn deployment(&self) -> DeploymentKind {
        self.deployment
    }

    /// Append percent-encoded path segments to the API root.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn paged(mut url: Url) -> Url {
        url.query_pairs_mut().append_pair("per_page", PAGE_SIZE);
        url
    }

    /// Issue an authenticated request without interpreting the status.
    async fn send_raw(&self, method: Method, url: Url, body: Option<&Value>) -> Result<Response> {
        tracing::debug!(%method, %url, "Calling Actions API");
        let mut request = self.http.request(method, url).bearer_auth(&self.token);
        if let Some(body) = body {
            request = request.json(body);
        }
        Ok(request.send().await?)
    }

    /// Issue an authenticated request and fail on any non-2xx status.
    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        resource: &str,
    ) -> Result<Response> {
        let response = self.send_raw(method, url, body).await?;
        check_status(response, resource).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, resource: &str) -> Result<T> {
        let response = self.send(Method::GET, url, None, resource).await?;
        Ok(response.json::<T>().await?)
    }

    /// Run a request whose only outcome is a status code.
    async fn expect_status(
        &self,
        method: Method,
        url: Url,
        expected: StatusCode,
        resource: &str,
    ) -> Result<bool> {
        let response = self.send(method, url, None, resource).await?;
        let status = response.status();
        if status != expected {
            tracing::warn!(%status, %expected, resource, "Unexpected success status");
        }
        Ok(status == expected)
    }

    fn run_endpoint(&self, owner: &str, repo: &str, run_id: u64, tail: &[&str]) -> Url {
        let run_id = run_id.to_string();
        let mut segments = vec!["repos", owner, repo, "actions", "runs", run_id.as_str()];
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }
}

/// Map a non-2xx response to the error taxonomy.
async fn check_status(response: Response, resource: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status == StatusCode::NOT_FOUND {
        return Err(Error::NotFound {
            resource: resource.to_string(),
        });
    }

    Err(Error::Remote {
        status: status.as_u16(),
        message: remote_message(&body, status),
    })
}

/// Prefer the API's JSON `message` field, then the raw body, then the reason phrase.
fn remote_message(body: &str, status: StatusCode) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .or_else(|| {
            let trimmed = body.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        })
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string())
}

#[async_trait]
impl ActionsApi for GitHubClient {
    async fn get_repository(&self, owner: &str, repo: &str) -> Result<Repository> {
        let url = self.endpoint(&["repos", owner, repo]);
        self.get_json(url, &format!("repository {}/{}", owner, repo))
            .await
    }

    async fn list_repositories(&self, owner: &str) -> Result<Vec<Repository>> {
        let url = Self::paged(self.endpoint(&["users", owner, "repos"]));
        self.get_json(url, &format!("account {}", owner)).await
    }

    async fn list_workflows(&self, owner: &str, repo: &str) -> Result<Vec<Workflow>> {
        let url = Self::paged(self.endpoint(&["repos", owner, repo, "actions", "workflows"]));
        let list: WorkflowList = self
            .get_json(url, &format!("workflows of {}/{}", owner, repo))
            .await?;
        Ok(list.workflows)
    }

    async fn get_workflow(&self, owner: &str, repo: &str, workflow_id: &str) -> Result<Workflow> {
        let url = self.endpoint(&["repos", owner, repo, "actions", "workflows", workflow_id]);
        self.get_json(url, &format!("workflow {} in {}/{}", workflow_id, owner, repo))
            .await
    }

    async fn trigger_workflow(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: &str,
        git_ref: &str,
        inputs: Option<Map<String, Value>>,
    ) -> Result<()> {
        let url = self.endpoint(&[
            "repos",
            owner,
            repo,
            "actions",
            "workflows",
            workflow_id,
            "dispatches",
        ]);
        let mut body = json!({ "ref": git_ref });
        if let Some(inputs) = inputs {
            body["inputs"] = Value::Object(inputs);
        }

        let resource = format!("workflow {} in {}/{}", workflow_id, owner, repo);
        self.send(Method::POST, url, Some(&body), &resource).await?;
        tracing::info!(owner, repo, workflow_id, git_ref, "Dispatched workflow");
        Ok(())
    }

    async fn list_workflow_runs(
        &self,
        owner: &str,
        repo: &str,
        workflow_id: &str,
    ) -> Result<Vec<WorkflowRun>> {
        let url = Self::paged(self.endpoint(&[
            "repos",
            owner,
            repo,
            "actions",
            "workflows",
            workflow_id,
            "runs",
        ]));
        let list: WorkflowRunList = self
            .get_json(url, &format!("runs of {} in {}/{}", workflow_id, owner, repo))
            .await?;
        Ok(list.workflow_runs)
    }

    async fn get_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<WorkflowRun> {
        let url = self.run_endpoint(owner, repo, run_id, &[]);
        self.get_json(url, &format!("run {} in {}/{}", run_id, owner, repo))
            .await
    }

    async fn cancel_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool> {
        let url = self.run_endpoint(owner, repo, run_id, &["cancel"]);
        let resource = format!("run {} in {}/{}", run_id, owner, repo);
        self.expect_status(Method::POST, url, StatusCode::ACCEPTED, &resource)
            .await
    }

    async fn rerun_workflow(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool> {
        let url = self.run_endpoint(owner, repo, run_id, &["rerun"]);
        let resource = format!("run {} in {}/{}", run_id, owner, repo);
        self.expect_status(Method::POST, url, StatusCode::CREATED, &resource)
            .await
    }

    async fn delete_workflow_run(&self, owner: &str, repo: &str, run_id: u64) -> Result<bool> {
        let url = self.run_endpoint(owner, repo, run_id, &[]);
        let resource = format!("run {} in {}/{}", run_id, owner, repo);
        self.expect_status(Method::DELETE, url, StatusCode::NO_CONTENT, &resource)
            .await
    }

    async fn workflow_run_logs_url(&self, owner: &str, repo: &str, run_id: u64) -> Result<String> {
        let url = self.run_endpoint(owner, repo, run_id, &["logs"]);
        let resource = format!("logs of run {} in {}/{}", run_id, owner, repo);

        let response = self.send_raw(Method::GET, url, None).await?;
        let status = response.status();
        if !status.is_redirection() {
            check_status(response, &resource).await?;
            return Err(Error::MissingRedirect {
                resource,
                status: status.as_u16(),
            });
        }

        response
            .headers()
            .get(LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or(Error::MissingRedirect {
                resource,
                status: status.as_u16(),
            })
    }

    async fn get_workflow_run_logs(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<String> {
        let location = self.workflow_run_logs_url(owner, repo, run_id).await?;
        let archive_url = self
            .base
            .join(&location)
            .map_err(|e| Error::config(format!("invalid log archive location: {}", e)))?;

        // The archive host is pre-signed; no credential is attached.
        tracing::debug!(owner, repo, run_id, "Downloading log archive");
        let response = self.http.get(archive_url).send().await?;
        let resource = format!("log archive of run {} in {}/{}", run_id, owner, repo);
        let bytes = check_status(response, &resource).await?.bytes().await?;

        extract_log_archive(&bytes)
    }

    async fn delete_workflow_run_logs(
        &self,
        owner: &str,
        repo: &str,
        run_id: u64,
    ) -> Result<bool> {
        let url = self.run_endpoint(owner, repo, run_id, &["logs"]);
        let resource = format!("logs of run {} in {}/{}", run_id, owner, repo);
        self.expect_status(Method::DELETE, url, StatusCode::NO_CONTENT, &resource)
            .await
    }
}
