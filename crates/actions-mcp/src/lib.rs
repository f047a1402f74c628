//! MCP Server for GitHub Actions
//!
//! This crate exposes repository, workflow and workflow-run operations of the
//! GitHub Actions platform via the Model Context Protocol (MCP), so that an
//! agent can inspect, trigger, cancel and clean up CI runs.
//!
//! # Architecture
//!
//! ```text
//! [ MCP Client ]              [ MCP Client ] [ MCP Client ]
//!      | stdio                       | GET /sse + POST /messages
//!      v                             v
//! [ StreamTransport ]        [ SseTransport (session table) ]
//!      |                             |
//!      +-------------+---------------+
//!                    v
//!          [ ActionsMcpServer ]  JSON-RPC 2.0
//!                    |
//!                    v
//!          [ Dispatcher ]  schema validation, error wrapping
//!                    | ActionsApi
//!                    v
//!          [ actions-client ]  --> REST API
//! ```
//!
//! # Tools
//!
//! See [`tools`] for the full catalog. Every tool result is text; failures
//! are reported in-band with `isError: true` rather than as protocol errors.

pub mod config;
pub mod dispatcher;
pub mod error;
mod handlers;
pub mod protocol;
pub mod server;
pub mod tools;
pub mod transport;

pub use config::{Overrides, ServerConfig, TransportKind};
pub use dispatcher::Dispatcher;
pub use error::{Error, Result};
pub use server::ActionsMcpServer;
pub use tools::{ToolContent, ToolDefinition, ToolRegistry, ToolResult, get_tool_definitions};
pub use transport::{SessionId, SessionTable, SseTransport, StreamTransport};
