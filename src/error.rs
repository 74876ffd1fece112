//! Error types for the help desk bridge
//!
//! Most adapter operations swallow these after logging them; only the
//! description lookup and ticket key extraction hand them back to callers.

use thiserror::Error;

/// Result type alias for help desk operations
pub type Result<T> = std::result::Result<T, HelpdeskError>;

/// Error type for help desk operations
#[derive(Error, Debug)]
pub enum HelpdeskError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Jira answered 404 for the requested resource
    #[error("Not found: {0}")]
    NotFound(String),

    /// Jira rejected the credentials (401/403)
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Any other non-success response from Jira
    #[error("Jira API error: HTTP {status}: {body}")]
    Api { status: u16, body: String },

    /// No ticket key in the given text
    #[error("No ticket key found in: {0}")]
    NoTicketKey(String),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl HelpdeskError {
    /// Whether Jira reported the resource as missing
    pub fn is_not_found(&self) -> bool {
        match self {
            HelpdeskError::NotFound(_) => true,
            HelpdeskError::Http(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            _ => false,
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            HelpdeskError::NotFound(_) => Some(404),
            HelpdeskError::Api { status, .. } => Some(*status),
            HelpdeskError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
