//! GitHub Actions MCP Server
//!
//! A Model Context Protocol server that exposes GitHub Actions repository,
//! workflow and workflow-run operations as tools.
//!
//! # Usage
//!
//! ```bash
//! actions-mcp [--transport stdio|sse] [--host <addr>] [--port <port>] [--config <file>]
//! ```
//!
//! # Environment Variables
//!
//! - `GITHUB_TOKEN`: Access token (required)
//! - `GITHUB_TYPE`: `cloud` (default) or `self-hosted`
//! - `GITHUB_BASE_URL`: API root for self-hosted installations
//! - `PORT`: Listen port for the SSE transport (default: 3000)
//! - `RUST_LOG`: Control log verbosity (default: `actions_mcp=info`)
//!
//! # Protocol
//!
//! JSON-RPC 2.0, either over stdio or over HTTP with Server-Sent Events.
//! Logs always go to stderr so stdout stays reserved for the protocol.

use std::path::PathBuf;
use std::sync::Arc;

use actions_client::{DeploymentKind, GitHubClient};
use actions_mcp::{
    ActionsMcpServer, Dispatcher, Overrides, ServerConfig, SseTransport, StreamTransport,
    TransportKind,
};
use clap::Parser;

/// MCP server for GitHub Actions
#[derive(Parser)]
#[command(name = "actions-mcp")]
#[command(about = "MCP server for GitHub Actions")]
#[command(version)]
struct Args {
    /// Transport to serve
    #[arg(short, long, value_enum)]
    transport: Option<TransportKind>,

    /// Listen address for the SSE transport
    #[arg(long)]
    host: Option<String>,

    /// Listen port for the SSE transport
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Optional TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Deployment kind: cloud or self-hosted
    #[arg(long, env = "GITHUB_TYPE")]
    github_type: Option<DeploymentKind>,

    /// API root for self-hosted installations
    #[arg(long, env = "GITHUB_BASE_URL")]
    base_url: Option<String>,

    /// Access token
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Upper bound in seconds for a single remote request
    #[arg(long)]
    timeout_secs: Option<u64>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            transport: self.transport,
            host: self.host.clone(),
            port: self.port,
            deployment: self.github_type,
            token: self.token.clone(),
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout_secs,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging to stderr (stdout is reserved for MCP protocol)
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("actions_mcp=info".parse()?)
                .add_directive("actions_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = ServerConfig::load(args.config.as_deref(), args.overrides())?;

    let client_config = config.client_config()?;
    tracing::info!(
        deployment = %client_config.deployment,
        api = %client_config.api_url(),
        transport = ?config.transport,
        "Starting actions-mcp server"
    );

    let client = GitHubClient::new(&client_config)?;
    let server = ActionsMcpServer::new(Dispatcher::new(Arc::new(client)));

    match config.transport {
        TransportKind::Stdio => StreamTransport::stdio().run(&server).await?,
        TransportKind::Sse => SseTransport::new(config.bind_addr()?).serve(server).await?,
    }

    Ok(())
}
