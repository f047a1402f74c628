//! Tool dispatch
//!
//! The single place where a tool invocation is validated, routed to its
//! handler, and turned into a [`ToolResult`]. Nothing a handler returns
//! escapes this layer as an error.

use std::sync::Arc;

use actions_client::ActionsApi;
use serde_json::{Map, Value};

use crate::Error;
use crate::tools::{ToolDefinition, ToolRegistry, ToolResult};

/// Routes tool calls to handlers over a shared platform client.
///
/// Cheap to clone; every session shares one dispatcher.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    api: Arc<dyn ActionsApi>,
}

impl Dispatcher {
    /// Dispatcher over the full tool catalog.
    pub fn new(api: Arc<dyn ActionsApi>) -> Self {
        Self::with_registry(ToolRegistry::catalog(), api)
    }

    pub fn with_registry(registry: ToolRegistry, api: Arc<dyn ActionsApi>) -> Self {
        Self {
            registry: Arc::new(registry),
            api,
        }
    }

    /// Registered tools in listing order.
    pub fn tools(&self) -> &[ToolDefinition] {
        self.registry.definitions()
    }

    /// Invoke the tool `name` with raw `arguments`.
    ///
    /// Unknown tools and schema violations never reach the platform client.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolResult {
        let Some(tool) = self.registry.get(name) else {
            tracing::warn!(tool = %name, "Unknown tool requested");
            return ToolResult::error(Error::UnknownTool(name.to_string()).to_string());
        };

        let normalized = match tool.input_schema.validate(arguments) {
            Ok(args) => args,
            Err(reason) => {
                tracing::debug!(tool = %name, %reason, "Rejected tool arguments");
                return ToolResult::error(format!("Invalid arguments for {}: {}", name, reason));
            }
        };

        let target = describe_target(&normalized);
        tracing::debug!(tool = %name, %target, "Dispatching tool");

        match (tool.handler)(Arc::clone(&self.api), Value::Object(normalized)).await {
            Ok(text) => ToolResult::text(text),
            Err(e) => {
                tracing::error!(tool = %name, error = %e, "Tool failed");
                ToolResult::error(format!("Error {} {}: {}", tool.action, target, e))
            }
        }
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("tools", &self.registry.len())
            .finish_non_exhaustive()
    }
}

/// Human-readable target of a call, built from its normalized arguments.
fn describe_target(args: &Map<String, Value>) -> String {
    let field = |key: &str| -> Option<String> {
        args.get(key).map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    };

    match (field("owner"), field("repo")) {
        (Some(owner), Some(repo)) => {
            if let Some(workflow) = field("workflowId") {
                format!("{} in {}/{}", workflow, owner, repo)
            } else if let Some(run) = field("runId") {
                format!("run {} in {}/{}", run, owner, repo)
            } else {
                format!("{}/{}", owner, repo)
            }
        }
        (Some(owner), None) => format!("for {}", owner),
        _ => String::new(),
    }
}
