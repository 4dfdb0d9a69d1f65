//! Error types for the Graph directory client.

use thiserror::Error;

/// Result type alias using `GraphError`.
pub type GraphResult<T> = Result<T, GraphError>;

/// Errors that can occur when talking to the directory service.
#[derive(Debug, Error)]
pub enum GraphError {
    /// Client configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Token acquisition itself failed.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// The process-wide reauthentication ceiling was reached.
    #[error("Token refresh ceiling reached after {attempts} reauthentication attempts")]
    AuthExhausted { attempts: u32 },

    /// The requested directory object does not exist.
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Any other non-success response from the Graph API.
    #[error("Graph API error: status {status} for {url}")]
    Api { status: u16, url: String },

    /// A member-add batch failed after earlier batches were applied.
    #[error("Member batch {batch_index} failed: {source}")]
    BatchFailed {
        batch_index: usize,
        #[source]
        source: Box<GraphError>,
    },

    /// HTTP transport error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphError {
    /// Returns true if this error (or its batch-wrapped source) is a
    /// fatal authentication condition that must abort the whole run.
    #[must_use]
    pub fn is_auth_fatal(&self) -> bool {
        match self {
            GraphError::Auth(_) | GraphError::AuthExhausted { .. } => true,
            GraphError::BatchFailed { source, .. } => source.is_auth_fatal(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_fatal_classification() {
        assert!(GraphError::Auth("bad secret".into()).is_auth_fatal());
        assert!(GraphError::AuthExhausted { attempts: 24 }.is_auth_fatal());
        assert!(!GraphError::NotFound("group-1".into()).is_auth_fatal());
        assert!(!GraphError::Api {
            status: 500,
            url: "https://example.test".into()
        }
        .is_auth_fatal());
    }

    #[test]
    fn test_batch_failed_propagates_auth_fatal() {
        let inner = GraphError::AuthExhausted { attempts: 24 };
        let err = GraphError::BatchFailed {
            batch_index: 1,
            source: Box::new(inner),
        };
        assert!(err.is_auth_fatal());

        let inner = GraphError::Api {
            status: 403,
            url: "https://example.test".into(),
        };
        let err = GraphError::BatchFailed {
            batch_index: 2,
            source: Box::new(inner),
        };
        assert!(!err.is_auth_fatal());
    }
}
