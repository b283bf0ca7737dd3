//! Error types for the research digest pipeline.
//!
//! Uses `thiserror` for structured error handling with automatic `From` implementations.

use std::time::Duration;

use crate::models::Source;

/// Errors from the HTTP client layer.
#[derive(thiserror::Error, Debug)]
pub enum ClientError {
    /// HTTP transport error (connection, DNS, TLS, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Rate limited by the remote API (429 response)
    #[error("Rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Suggested wait time before retry
        retry_after: Duration,
    },

    /// Resource not found (404 response)
    #[error("Resource not found: {resource}")]
    NotFound {
        /// Description of the missing resource
        resource: String,
    },

    /// Invalid request parameters (400 response)
    #[error("Bad request: {message}")]
    BadRequest {
        /// Error message from API
        message: String,
    },

    /// Request timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// JSON parsing error
    #[error("Failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// XML parsing error
    #[error("Failed to parse XML response: {0}")]
    Xml(String),

    /// Server error (5xx response)
    #[error("Server error ({status}): {message}")]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Unexpected HTTP status
    #[error("Unexpected status {status}: {message}")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Response body or message
        message: String,
    },
}

impl ClientError {
    /// Create a rate limited error with retry-after duration.
    #[must_use]
    pub fn rate_limited(seconds: u64) -> Self {
        Self::RateLimited { retry_after: Duration::from_secs(seconds) }
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound { resource: resource.into() }
    }

    /// Create a bad request error.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest { message: message.into() }
    }

    /// Create a server error.
    #[must_use]
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        Self::Server { status, message: message.into() }
    }

    /// Create an XML parse error.
    #[must_use]
    pub fn xml(message: impl std::fmt::Display) -> Self {
        Self::Xml(message.to_string())
    }

    /// Get the retry-after duration if this is a rate limit error.
    #[must_use]
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}

impl From<quick_xml::DeError> for ClientError {
    fn from(err: quick_xml::DeError) -> Self {
        Self::xml(err)
    }
}

impl From<quick_xml::Error> for ClientError {
    fn from(err: quick_xml::Error) -> Self {
        Self::xml(err)
    }
}

/// A single source failed during one fetch.
///
/// Never aborts the request: the orchestrator records it in
/// [`FetchResult::errors`](crate::models::FetchResult) and carries on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchError {
    /// Source that failed.
    pub source: Source,
    /// Human-readable reason.
    pub message: String,
}

impl FetchError {
    /// Create a fetch error for a source.
    #[must_use]
    pub fn new(source: Source, message: impl Into<String>) -> Self {
        Self { source, message: message.into() }
    }

    /// Wrap a client error raised while talking to `source`.
    #[must_use]
    pub fn from_client(source: Source, err: &ClientError) -> Self {
        Self::new(source, err.to_string())
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.source, self.message)
    }
}

impl std::error::Error for FetchError {}

/// Errors from loading or validating research settings.
#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    /// Settings file could not be read
    #[error("Failed to read settings file {path}: {source}")]
    Io {
        /// File path
        path: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not valid JSON for the schema
    #[error("Invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A field failed validation
    #[error("Invalid setting '{field}': {message}")]
    Invalid {
        /// Offending field
        field: String,
        /// Validation message
        message: String,
    },
}

impl SettingsError {
    /// Create a validation error.
    #[must_use]
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid { field: field.into(), message: message.into() }
    }
}

/// Errors surfaced to the caller of the digest service.
#[derive(thiserror::Error, Debug)]
pub enum DigestError {
    /// The request cannot be run (no sources, no keywords, ...)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Export was requested before any fetch completed
    #[error("No fetch result is cached yet; run a fetch first")]
    NoCachedResult,

    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Internal pipeline defect
    #[error("Internal error: {0}")]
    Internal(String),
}

impl DigestError {
    /// Create a configuration error.
    #[must_use]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Create an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Convert to a user-friendly error message.
    #[must_use]
    pub fn to_user_message(&self) -> String {
        match self {
            Self::Configuration(message) => format!("Cannot fetch papers: {message}"),
            Self::NoCachedResult => {
                "Nothing to export yet. Fetch papers first, then export.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type alias for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type alias for digest operations.
pub type DigestResult<T> = Result<T, DigestError>;
