//! Error taxonomy shared by the router, the upstream clients and the handlers.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::resilience::retries::{classify_status, FailureClass, RetryClassify};

/// Errors surfaced by a relay invocation.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Missing or malformed caller configuration (credentials).
    #[error("{0}")]
    Configuration(String),

    /// The LWA token endpoint rejected the credentials.
    #[error("LWA Authentication failed: {0}")]
    Authentication(String),

    /// No handler is registered under the requested name.
    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    /// Request body or operation payload failed to decode.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Upstream answered with a non-success status.
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The invocation ran past the request deadline.
    #[error("Operation timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Network-level failure talking to an upstream.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),

    /// An error annotated with the operation that produced it.
    #[error("{context}: {source}")]
    Context {
        context: &'static str,
        #[source]
        source: Box<RelayError>,
    },
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

/// Error classification reported in the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Configuration,
    Authentication,
    Permanent,
    Transient,
    UnknownOperation,
    InvalidRequest,
}

impl RelayError {
    /// Wrap this error with the name of the failing operation.
    pub fn context(self, context: &'static str) -> Self {
        RelayError::Context {
            context,
            source: Box::new(self),
        }
    }

    /// Innermost error, skipping context annotations.
    pub fn root(&self) -> &RelayError {
        match self {
            RelayError::Context { source, .. } => source.root(),
            other => other,
        }
    }

    /// Upstream HTTP status, if the failure came from an upstream response.
    pub fn upstream_status(&self) -> Option<u16> {
        match self.root() {
            RelayError::Upstream { status, .. } => Some(*status),
            RelayError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            RelayError::Context { source, .. } => source.kind(),
            RelayError::Configuration(_) => ErrorKind::Configuration,
            RelayError::Authentication(_) => ErrorKind::Authentication,
            RelayError::UnknownOperation(_) => ErrorKind::UnknownOperation,
            RelayError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            RelayError::Upstream { status, .. } => match classify_status(Some(*status)) {
                FailureClass::Permanent => ErrorKind::Permanent,
                FailureClass::Transient => ErrorKind::Transient,
            },
            RelayError::Transport(_) | RelayError::Timeout(_) => ErrorKind::Transient,
        }
    }

    /// Messages of this error and all of its sources, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut out = vec![self.to_string()];
        let mut current: Option<&dyn std::error::Error> = std::error::Error::source(self);
        while let Some(err) = current {
            out.push(err.to_string());
            current = err.source();
        }
        out
    }
}

impl RetryClassify for RelayError {
    fn status_code(&self) -> Option<u16> {
        self.upstream_status()
    }

    fn is_permanent(&self) -> bool {
        match self.root() {
            RelayError::Upstream { status, .. } => {
                classify_status(Some(*status)) == FailureClass::Permanent
            }
            RelayError::Transport(_) => false,
            // Local failures never get better by waiting.
            _ => true,
        }
    }
}

impl From<serde_json::Error> for RelayError {
    fn from(err: serde_json::Error) -> Self {
        RelayError::InvalidRequest(err.to_string())
    }
}
