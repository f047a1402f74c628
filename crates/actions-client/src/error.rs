//! Error types for actions-client

/// Result type for actions-client operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to the Actions REST API
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Invalid client configuration: {message}")]
    Config { message: String },

    #[error("Not found: {resource}")]
    NotFound { resource: String },

    #[error("Remote returned {status}: {message}")]
    Remote { status: u16, message: String },

    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Log archive exceeds {limit} bytes when decompressed")]
    LogTooLarge { limit: u64 },

    #[error("Expected a redirect to the log archive for {resource}, got status {status}")]
    MissingRedirect { resource: String, status: u16 },
}

impl Error {
    /// Create a configuration error with the given message
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if the remote produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::NotFound { .. } => Some(404),
            Error::Remote { status, .. } | Error::MissingRedirect { status, .. } => Some(*status),
            Error::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
