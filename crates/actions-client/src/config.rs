//! Client configuration
//!
//! Built once at startup and handed to [`crate::GitHubClient::new`]. Nothing in
//! this crate reads the environment directly.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Public API root used for cloud deployments.
pub const CLOUD_API_URL: &str = "https://api.github.com";

/// Default bound applied to every remote request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Where the platform is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeploymentKind {
    /// The public cloud service at [`CLOUD_API_URL`].
    #[default]
    Cloud,

    /// A self-hosted (enterprise server) installation.
    ///
    /// Requires an explicit API base URL.
    #[serde(alias = "enterprise")]
    SelfHosted,
}

impl FromStr for DeploymentKind {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cloud" | "github" => Ok(DeploymentKind::Cloud),
            "self-hosted" | "selfhosted" | "enterprise" | "ghes" => Ok(DeploymentKind::SelfHosted),
            other => Err(Error::config(format!(
                "unknown deployment kind '{}' (expected 'cloud' or 'self-hosted')",
                other
            ))),
        }
    }
}

impl fmt::Display for DeploymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeploymentKind::Cloud => write!(f, "cloud"),
            DeploymentKind::SelfHosted => write!(f, "self-hosted"),
        }
    }
}

/// Connection settings for the Actions REST API.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Cloud or self-hosted
    pub deployment: DeploymentKind,

    /// Pre-obtained access token
    pub token: String,

    /// API root for self-hosted installations (ignored for cloud)
    pub base_url: Option<String>,

    /// Upper bound for a single remote request, archive downloads included
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Config for the cloud service with the default timeout.
    pub fn cloud(token: impl Into<String>) -> Self {
        Self {
            deployment: DeploymentKind::Cloud,
            token: token.into(),
            base_url: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Config for a self-hosted installation rooted at `base_url`.
    pub fn self_hosted(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            deployment: DeploymentKind::SelfHosted,
            token: token.into(),
            base_url: Some(base_url.into()),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Check that the config can be used to build a client.
    pub fn validate(&self) -> Result<()> {
        if self.token.trim().is_empty() {
            return Err(Error::config("an access token is required"));
        }
        if self.request_timeout.is_zero() {
            return Err(Error::config("request timeout must be greater than zero"));
        }
        if self.deployment == DeploymentKind::SelfHosted {
            match self.base_url.as_deref().map(str::trim) {
                Some(url) if !url.is_empty() => {}
                _ => {
                    return Err(Error::config(
                        "a base URL is required for self-hosted deployments",
                    ));
                }
            }
        }
        Ok(())
    }

    /// API root with any trailing slash removed.
    pub fn api_url(&self) -> &str {
        match (self.deployment, self.base_url.as_deref()) {
            (DeploymentKind::SelfHosted, Some(url)) => url.trim().trim_end_matches('/'),
            _ => CLOUD_API_URL,
        }
    }
}
