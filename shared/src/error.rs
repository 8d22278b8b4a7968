//! Error types for the calendar sync job.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Why the task service refused (or never answered) a create call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorKind {
    RateLimited,
    AuthRejected,
    MalformedRequest,
    Unavailable,
    Transport,
}

impl ServiceErrorKind {
    /// Classify a non-success HTTP status from the task service.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            401 | 403 => Self::AuthRejected,
            400..=499 => Self::MalformedRequest,
            _ => Self::Unavailable,
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RateLimited => "rate limited",
            Self::AuthRejected => "auth rejected",
            Self::MalformedRequest => "malformed request",
            Self::Unavailable => "service unavailable",
            Self::Transport => "transport failure",
        };
        f.write_str(label)
    }
}

/// Errors that can occur during a sync invocation.
#[derive(Error, Debug)]
pub enum Error {
    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Calendar feed could not be fetched
    #[error("Network error: {0}")]
    Network(String),

    /// Calendar document or entry could not be parsed
    #[error("Format error: {0}")]
    Format(String),

    /// Task service rejected a single request
    #[error("Service error ({kind}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    /// AWS SDK error
    #[error("AWS error: {0}")]
    Aws(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error aborts the whole invocation.
    ///
    /// Service errors are scoped to one task; everything else stops the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::Service { .. })
    }
}
