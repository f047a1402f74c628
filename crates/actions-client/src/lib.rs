//! GitHub Actions client for the actions-mcp tool server
//!
//! Wraps the repository, workflow and workflow-run endpoints of the Actions
//! REST API behind the [`ActionsApi`] trait. The tool server only ever talks
//! to the trait, so tests can swap in a stub.
//!
//! ```text
//! [ actions-mcp dispatcher ]
//!        | ActionsApi
//!        v
//! [ GitHubClient ] --reqwest--> [ api.github.com | self-hosted ]
//!        |
//!        +--> [ log archive host ] --zip--> combined text
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod error;
pub mod logs;
pub mod types;

pub use api::ActionsApi;
pub use client::GitHubClient;
pub use config::{CLOUD_API_URL, ClientConfig, DEFAULT_REQUEST_TIMEOUT, DeploymentKind};
pub use error::{Error, Result};
pub use logs::{MAX_LOG_BYTES, extract_log_archive, extract_log_archive_with_limit};
pub use types::{Account, Repository, Workflow, WorkflowRun};
