//! MCP Tool definitions
//!
//! The fixed catalog of tools this server exposes, the input-schema
//! descriptor each tool declares, and the uniform result envelope.
//!
//! # Tool Categories
//!
//! ## Repositories
//! - `list-repositories` - List repositories of a user or organization
//! - `get-repository` - Show repository details
//!
//! ## Workflows
//! - `get-workflows` - List workflows defined in a repository
//! - `get-workflow` - Show a single workflow
//! - `trigger-workflow` - Dispatch a workflow run
//!
//! ## Workflow Runs
//! - `list-workflow-runs` - List runs of a workflow
//! - `get-workflow-run` - Show a single run
//! - `cancel-workflow-run` - Cancel a run
//! - `rerun-workflow` - Re-run a run
//! - `delete-workflow-run` - Delete a run
//!
//! ## Logs
//! - `get-workflow-run-logs` - Download and combine a run's logs
//! - `get-workflow-run-logs-url` - Archive download location of a run's logs
//! - `delete-workflow-run-logs` - Delete a run's logs

use std::sync::Arc;

use actions_client::ActionsApi;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::Result;
use crate::handlers;

/// Future returned by a tool handler.
pub type ToolFuture = BoxFuture<'static, Result<String>>;

/// A tool handler receives the platform client and the validated,
/// normalized arguments, and returns the human-readable success text.
pub type ToolHandler = fn(Arc<dyn ActionsApi>, Value) -> ToolFuture;

/// Shape a single parameter must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// A string, or an array whose first element is a string
    String,
    /// A non-negative integer, or a string of decimal digits
    Integer,
    /// A free-form JSON object, passed through verbatim
    Object,
}

impl ParamKind {
    fn json_type(self) -> &'static str {
        match self {
            ParamKind::String => "string",
            ParamKind::Integer => "integer",
            ParamKind::Object => "object",
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    pub name: &'static str,
    pub kind: ParamKind,
    pub required: bool,
    pub description: &'static str,
}

/// Ordered parameter list of a tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputSchema {
    params: Vec<ParamSpec>,
}

impl InputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a required parameter.
    pub fn required(mut self, name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        self.params.push(ParamSpec {
            name,
            kind,
            required: true,
            description,
        });
        self
    }

    /// Add an optional parameter.
    pub fn optional(mut self, name: &'static str, kind: ParamKind, description: &'static str) -> Self {
        self.params.push(ParamSpec {
            name,
            kind,
            required: false,
            description,
        });
        self
    }

    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// JSON Schema rendering used by `tools/list`.
    pub fn to_json(&self) -> Value {
        let mut properties = Map::new();
        for param in &self.params {
            properties.insert(
                param.name.to_string(),
                json!({
                    "type": param.kind.json_type(),
                    "description": param.description,
                }),
            );
        }
        let required: Vec<&str> = self
            .params
            .iter()
            .filter(|p| p.required)
            .map(|p| p.name)
            .collect();

        json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check `arguments` against the schema and return the normalized
    /// argument object.
    ///
    /// Only declared parameters are kept. Strings delivered as arrays
    /// collapse to their first element; digit strings become integers.
    pub fn validate(&self, arguments: Value) -> std::result::Result<Map<String, Value>, String> {
        let mut supplied = match arguments {
            Value::Object(map) => map,
            Value::Null => Map::new(),
            other => return Err(format!("expected an object, got {}", type_name(&other))),
        };

        let mut normalized = Map::new();
        for param in &self.params {
            match supplied.remove(param.name) {
                None | Some(Value::Null) => {
                    if param.required {
                        return Err(format!("missing required parameter '{}'", param.name));
                    }
                }
                Some(value) => {
                    let value = normalize(param, value)?;
                    normalized.insert(param.name.to_string(), value);
                }
            }
        }
        Ok(normalized)
    }
}

fn normalize(param: &ParamSpec, value: Value) -> std::result::Result<Value, String> {
    match param.kind {
        ParamKind::String => ensure_string(&value)
            .map(|s| Value::String(s.to_string()))
            .ok_or_else(|| format!("parameter '{}' must be a string, got {}", param.name, type_name(&value))),
        ParamKind::Integer => match &value {
            Value::Number(n) if n.is_u64() => Ok(value),
            Value::String(s) if !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()) => s
                .parse::<u64>()
                .map(Value::from)
                .map_err(|_| format!("parameter '{}' is out of range", param.name)),
            _ => Err(format!(
                "parameter '{}' must be a non-negative integer, got {}",
                param.name,
                type_name(&value)
            )),
        },
        ParamKind::Object => match value {
            Value::Object(_) => Ok(value),
            other => Err(format!(
                "parameter '{}' must be an object, got {}",
                param.name,
                type_name(&other)
            )),
        },
    }
}

/// Collapse a string-or-array value to a single string.
///
/// Some transports deliver a query parameter as an array; the first element
/// wins. Returns `None` for anything that is not a string or an array whose
/// first element is a string.
pub fn ensure_string(value: &Value) -> Option<&str> {
    match value {
        Value::String(s) => Some(s),
        Value::Array(items) => items.first().and_then(Value::as_str),
        _ => None,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Tool definition for MCP protocol
#[derive(Clone)]
pub struct ToolDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: InputSchema,
    /// Gerund used in failure messages, e.g. "triggering workflow"
    pub action: &'static str,
    pub handler: ToolHandler,
}

impl ToolDefinition {
    /// Listing entry for `tools/list`.
    pub fn to_json(&self) -> Value {
        json!({
            "name": self.name,
            "description": self.description,
            "inputSchema": self.input_schema.to_json(),
        })
    }
}

impl std::fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("action", &self.action)
            .field("input_schema", &self.input_schema)
            .finish_non_exhaustive()
    }
}

/// Result from a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default)]
    pub is_error: bool,
}

/// Content types for tool results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolContent {
    #[serde(rename = "text")]
    Text { text: String },
}

impl ToolResult {
    /// Create a successful text result
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: content.into(),
            }],
            is_error: false,
        }
    }

    /// Create an error result
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text {
                text: message.into(),
            }],
            is_error: true,
        }
    }

    /// All text blocks joined with newlines.
    pub fn text_content(&self) -> String {
        self.content
            .iter()
            .map(|block| match block {
                ToolContent::Text { text } => text.as_str(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Name-indexed set of tools, fixed at construction.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    tools: Vec<ToolDefinition>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the full catalog from [`get_tool_definitions`].
    pub fn catalog() -> Self {
        let mut registry = Self::new();
        for tool in get_tool_definitions() {
            registry.register(tool);
        }
        registry
    }

    /// Add a tool.
    ///
    /// # Panics
    ///
    /// Panics when a tool with the same name is already registered.
    pub fn register(&mut self, tool: ToolDefinition) {
        assert!(
            self.get(tool.name).is_none(),
            "tool '{}' registered twice",
            tool.name
        );
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&ToolDefinition> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Tools in registration order.
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.tools
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

const OWNER: &str = "Repository owner (user or organization)";
const REPO: &str = "Repository name";
const WORKFLOW_ID: &str = "Workflow id or workflow file name (e.g. ci.yml)";
const RUN_ID: &str = "Workflow run id";

fn owner_repo() -> InputSchema {
    InputSchema::new()
        .required("owner", ParamKind::String, OWNER)
        .required("repo", ParamKind::String, REPO)
}

fn run_schema() -> InputSchema {
    owner_repo().required("runId", ParamKind::Integer, RUN_ID)
}

/// Get all available tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        // Repositories
        ToolDefinition {
            name: "list-repositories",
            description: "List repositories for a user or organization",
            input_schema: InputSchema::new().required("owner", ParamKind::String, OWNER),
            action: "listing repositories",
            handler: handlers::list_repositories,
        },
        ToolDefinition {
            name: "get-repository",
            description: "Get details of a repository",
            input_schema: owner_repo(),
            action: "getting repository",
            handler: handlers::get_repository,
        },
        // Workflows
        ToolDefinition {
            name: "get-workflows",
            description: "List the workflows defined in a repository",
            input_schema: owner_repo(),
            action: "listing workflows",
            handler: handlers::get_workflows,
        },
        ToolDefinition {
            name: "get-workflow",
            description: "Get details of a single workflow",
            input_schema: owner_repo().required("workflowId", ParamKind::String, WORKFLOW_ID),
            action: "getting workflow",
            handler: handlers::get_workflow,
        },
        ToolDefinition {
            name: "trigger-workflow",
            description: "Trigger a GitHub Actions workflow",
            input_schema: owner_repo()
                .required("workflowId", ParamKind::String, WORKFLOW_ID)
                .required("ref", ParamKind::String, "Git ref (branch or tag) to run on")
                .optional(
                    "inputs",
                    ParamKind::Object,
                    "Workflow dispatch inputs, passed through verbatim",
                ),
            action: "triggering workflow",
            handler: handlers::trigger_workflow,
        },
        // Workflow runs
        ToolDefinition {
            name: "list-workflow-runs",
            description: "List runs of a workflow",
            input_schema: owner_repo().required("workflowId", ParamKind::String, WORKFLOW_ID),
            action: "listing workflow runs",
            handler: handlers::list_workflow_runs,
        },
        ToolDefinition {
            name: "get-workflow-run",
            description: "Get details of a workflow run",
            input_schema: run_schema(),
            action: "getting workflow",
            handler: handlers::get_workflow_run,
        },
        ToolDefinition {
            name: "cancel-workflow-run",
            description: "Cancel a workflow run",
            input_schema: run_schema(),
            action: "cancelling workflow",
            handler: handlers::cancel_workflow_run,
        },
        ToolDefinition {
            name: "rerun-workflow",
            description: "Re-run a workflow run",
            input_schema: run_schema(),
            action: "re-running workflow",
            handler: handlers::rerun_workflow,
        },
        ToolDefinition {
            name: "delete-workflow-run",
            description: "Delete a workflow run",
            input_schema: run_schema(),
            action: "deleting workflow",
            handler: handlers::delete_workflow_run,
        },
        // Logs
        ToolDefinition {
            name: "get-workflow-run-logs",
            description: "Download the logs of a workflow run as combined text",
            input_schema: run_schema(),
            action: "getting logs for workflow",
            handler: handlers::get_workflow_run_logs,
        },
        ToolDefinition {
            name: "get-workflow-run-logs-url",
            description: "Get the download URL of a workflow run's log archive",
            input_schema: run_schema(),
            action: "getting log URL for workflow",
            handler: handlers::get_workflow_run_logs_url,
        },
        ToolDefinition {
            name: "delete-workflow-run-logs",
            description: "Delete the logs of a workflow run",
            input_schema: run_schema(),
            action: "deleting logs for workflow",
            handler: handlers::delete_workflow_run_logs,
        },
    ]
}
