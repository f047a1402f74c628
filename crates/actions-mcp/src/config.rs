//! Server configuration
//!
//! Settings are assembled once at startup: an optional TOML file first,
//! then command-line and environment overrides on top. The result is
//! validated before any client is built.
//!
//! ```toml
//! transport = "sse"
//! host = "0.0.0.0"
//! port = 3000
//!
//! [github]
//! type = "self-hosted"
//! base_url = "https://ghe.example.com/api/v3"
//! timeout_secs = 30
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use actions_client::{ClientConfig, DEFAULT_REQUEST_TIMEOUT, DeploymentKind};
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Which transport the binary serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    /// Single session over stdin/stdout
    #[default]
    Stdio,
    /// Multiplexed sessions over HTTP with Server-Sent Events
    Sse,
}

/// `[github]` table of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubSettings {
    #[serde(rename = "type")]
    pub deployment: DeploymentKind,
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

/// Complete server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub transport: TransportKind,
    pub host: String,
    pub port: u16,
    pub github: GitHubSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            transport: TransportKind::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            github: GitHubSettings::default(),
        }
    }
}

/// Values from the command line or environment; `None` leaves the file
/// (or default) value in place.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub transport: Option<TransportKind>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub deployment: Option<DeploymentKind>,
    pub token: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Load the optional config file, apply overrides and validate.
    pub fn load(path: Option<&Path>, overrides: Overrides) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                let content = std::fs::read_to_string(path).map_err(|e| {
                    Error::config(format!("failed to read {}: {}", path.display(), e))
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };

        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(transport) = overrides.transport {
            self.transport = transport;
        }
        if let Some(host) = overrides.host {
            self.host = host;
        }
        if let Some(port) = overrides.port {
            self.port = port;
        }
        if let Some(deployment) = overrides.deployment {
            self.github.deployment = deployment;
        }
        if let Some(token) = overrides.token {
            self.github.token = Some(token);
        }
        if let Some(base_url) = overrides.base_url {
            self.github.base_url = Some(base_url);
        }
        if let Some(timeout) = overrides.timeout_secs {
            self.github.timeout_secs = Some(timeout);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.client_config()?;
        if self.transport == TransportKind::Sse {
            self.bind_addr()?;
        }
        Ok(())
    }

    /// Validated settings for the platform client.
    pub fn client_config(&self) -> Result<ClientConfig> {
        let token = self
            .github
            .token
            .clone()
            .ok_or_else(|| Error::config("a GitHub token is required (set GITHUB_TOKEN)"))?;

        let config = ClientConfig {
            deployment: self.github.deployment,
            token,
            base_url: self.github.base_url.clone(),
            request_timeout: self
                .github
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
        };
        config.validate()?;
        Ok(config)
    }

    /// Socket address for the SSE listener.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| Error::config(format!("invalid listen address {}:{}: {}", self.host, self.port, e)))?
            .next()
            .ok_or_else(|| Error::config(format!("{}:{} resolved to no address", self.host, self.port)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn with_token() -> Overrides {
        Overrides {
            token: Some("ghp_test".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::load(None, with_token()).unwrap();
        assert_eq!(config.transport, TransportKind::Stdio);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 3000);

        let client = config.client_config().unwrap();
        assert_eq!(client.deployment, DeploymentKind::Cloud);
        assert_eq!(client.request_timeout, DEFAULT_REQUEST_TIMEOUT);
    }

    #[test]
    fn test_missing_token_is_rejected() {
        let err = ServerConfig::load(None, Overrides::default()).unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_self_hosted_requires_base_url() {
        let overrides = Overrides {
            deployment: Some(DeploymentKind::SelfHosted),
            ..with_token()
        };
        let err = ServerConfig::load(None, overrides).unwrap_err();
        assert!(matches!(err, Error::Client(_)));
    }

    #[test]
    fn test_file_then_overrides() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
transport = "sse"
port = 8080

[github]
type = "enterprise"
base_url = "https://ghe.example.com/api/v3/"
token = "from-file"
timeout_secs = 5
"#
        )
        .unwrap();

        let overrides = Overrides {
            port: Some(9090),
            token: Some("from-env".to_string()),
            ..Default::default()
        };
        let config = ServerConfig::load(Some(file.path()), overrides).unwrap();

        assert_eq!(config.transport, TransportKind::Sse);
        assert_eq!(config.port, 9090);
        assert_eq!(config.bind_addr().unwrap().port(), 9090);

        let client = config.client_config().unwrap();
        assert_eq!(client.token, "from-env");
        assert_eq!(client.deployment, DeploymentKind::SelfHosted);
        assert_eq!(client.api_url(), "https://ghe.example.com/api/v3");
        assert_eq!(client.request_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = ServerConfig::from_toml_str("listen = true").unwrap_err();
        assert!(matches!(err, Error::TomlParse(_)));
    }

    #[test]
    fn test_unreadable_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = ServerConfig::load(Some(&missing), with_token()).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
