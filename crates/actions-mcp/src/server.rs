//! MCP Server implementation
//!
//! Protocol handling shared by every transport: a raw JSON-RPC line in,
//! a serialized response (or nothing, for notifications) out.

use serde_json::{Value, json};

use crate::dispatcher::Dispatcher;
use crate::protocol::{
    INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST, InitializeResult, JsonRpcRequest,
    JsonRpcResponse, METHOD_NOT_FOUND, PARSE_ERROR, PROTOCOL_VERSION, ServerCapabilities,
    ServerInfo, ToolCallParams, ToolsCapability,
};
use crate::{Error, Result};

/// MCP Server for GitHub Actions
///
/// Exposes repository, workflow and workflow-run operations as MCP tools.
/// Holds no per-session state, so one instance serves every session of
/// every transport.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use actions_client::{ClientConfig, GitHubClient};
/// use actions_mcp::{ActionsMcpServer, Dispatcher};
///
/// let client = GitHubClient::new(&ClientConfig::cloud("ghp_token"))?;
/// let server = ActionsMcpServer::new(Dispatcher::new(Arc::new(client)));
/// let reply = server.respond(r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#).await;
/// ```
#[derive(Debug, Clone)]
pub struct ActionsMcpServer {
    dispatcher: Dispatcher,
}

impl ActionsMcpServer {
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self { dispatcher }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Handle one raw message and always produce a reply when one is owed.
    ///
    /// Unparseable input yields a `-32700` error with a null id; other
    /// internal failures yield `-32603`. Returns `None` for notifications.
    pub async fn respond(&self, message: &str) -> Option<String> {
        match self.handle_message(message).await {
            Ok(response) if response.is_empty() => None,
            Ok(response) => Some(response),
            Err(Error::Json(e)) => {
                tracing::warn!(error = %e, "Unparseable message");
                self.parse_error(&e.to_string())
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to handle message");
                serialize(&JsonRpcResponse::error(
                    None,
                    INTERNAL_ERROR,
                    format!("Internal error: {}", e),
                ))
            }
        }
    }

    /// `-32700` reply with a null id for input that could not be read as JSON.
    pub fn parse_error(&self, detail: &str) -> Option<String> {
        serialize(&JsonRpcResponse::error(
            None,
            PARSE_ERROR,
            format!("Parse error: {}", detail),
        ))
    }

    /// Handle a single MCP message
    ///
    /// Parses the JSON-RPC request and dispatches to the appropriate handler.
    /// JSON that is not a request object gets `-32600`, keeping its id.
    ///
    /// # Returns
    ///
    /// The JSON-RPC response as a string, or empty string for notifications.
    pub async fn handle_message(&self, message: &str) -> Result<String> {
        let value: Value = serde_json::from_str(message)?;
        let request: JsonRpcRequest = match serde_json::from_value(value.clone()) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(error = %e, "Message is not a JSON-RPC request");
                let id = value.get("id").cloned();
                let response =
                    JsonRpcResponse::error(id, INVALID_REQUEST, format!("Invalid request: {}", e));
                return serde_json::to_string(&response).map_err(Error::from);
            }
        };
        tracing::debug!(method = %request.method, "Received request");

        if request.is_notification() {
            // Notifications never get a reply, whatever the method.
            tracing::debug!(method = %request.method, "Notification received");
            return Ok(String::new());
        }

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id)?,
            "ping" => JsonRpcResponse::success(request.id, json!({})),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params).await?,
            _ => JsonRpcResponse::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        };

        serde_json::to_string(&response).map_err(Error::from)
    }

    fn handle_initialize(&self, id: Option<Value>) -> Result<JsonRpcResponse> {
        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "actions-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }

    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let tools: Vec<Value> = self
            .dispatcher
            .tools()
            .iter()
            .map(|tool| tool.to_json())
            .collect();

        JsonRpcResponse::success(id, json!({ "tools": tools }))
    }

    async fn handle_tools_call(&self, id: Option<Value>, params: Value) -> Result<JsonRpcResponse> {
        let params: ToolCallParams = match serde_json::from_value(params) {
            Ok(params) => params,
            Err(e) => {
                return Ok(JsonRpcResponse::error(
                    id,
                    INVALID_PARAMS,
                    format!("Invalid params: {}", e),
                ));
            }
        };

        let result = self
            .dispatcher
            .dispatch(&params.name, params.arguments)
            .await;
        Ok(JsonRpcResponse::success(id, serde_json::to_value(result)?))
    }
}

fn serialize(response: &JsonRpcResponse) -> Option<String> {
    match serde_json::to_string(response) {
        Ok(json) => Some(json),
        Err(e) => {
            tracing::error!(error = %e, "Failed to serialize error response");
            None
        }
    }
}
