//! Shared test utilities for the actions-mcp workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`stub`] - [`StubActions`], a recording [`actions_client::ActionsApi`] stub
//! - [`fixtures`] - canned remote entities and in-memory log archives

pub mod fixtures;
pub mod stub;

pub use stub::{RecordedCall, StubActions};
