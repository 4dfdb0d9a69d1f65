//! Error types for the reconciliation engine.

use thiserror::Error;

use groupsync_graph::GraphError;

/// Result type alias using `EngineError`.
pub type EngineResult<T> = Result<T, EngineError>;

/// Failure classes as seen by operators; severity drives the final exit
/// code of a run when multiple entries fail differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FailureClass {
    /// Token acquisition failed or the refresh ceiling was exhausted.
    Auth,
    /// The configuration document could not be fetched or parsed.
    ConfigFetch,
    /// Group identity or entry configuration did not validate.
    Validation,
    /// Membership resolution against the directory failed.
    Resolve,
    /// A member-add batch failed.
    AddMembers,
    /// A member removal failed.
    RemoveMember,
    /// Anything else.
    Unclassified,
}

/// Errors that can occur while reconciling one entry or preparing a run.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The remote configuration document could not be obtained.
    #[error("Failed to fetch configuration from {url}: {reason}")]
    ConfigFetch { url: String, reason: String },

    /// An entry failed validation before any mutation.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Membership resolution failed.
    #[error("Membership resolution failed: {source}")]
    Resolve {
        #[source]
        source: GraphError,
    },

    /// Applying member additions failed.
    #[error("Member add failed: {source}")]
    AddMembers {
        #[source]
        source: GraphError,
    },

    /// Applying a member removal failed.
    #[error("Member remove failed: {source}")]
    RemoveMember {
        #[source]
        source: GraphError,
    },

    /// Any other directory client failure.
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl EngineError {
    /// Returns true if this error must abort the whole run.
    #[must_use]
    pub fn is_auth_fatal(&self) -> bool {
        match self {
            EngineError::Resolve { source }
            | EngineError::AddMembers { source }
            | EngineError::RemoveMember { source } => source.is_auth_fatal(),
            EngineError::Graph(source) => source.is_auth_fatal(),
            _ => false,
        }
    }

    /// Maps the error to its operator-facing failure class.
    #[must_use]
    pub fn class(&self) -> FailureClass {
        if self.is_auth_fatal() {
            return FailureClass::Auth;
        }
        match self {
            EngineError::ConfigFetch { .. } => FailureClass::ConfigFetch,
            EngineError::Validation(_) => FailureClass::Validation,
            EngineError::Resolve { .. } => FailureClass::Resolve,
            EngineError::AddMembers { .. } => FailureClass::AddMembers,
            EngineError::RemoveMember { .. } => FailureClass::RemoveMember,
            EngineError::Graph(_) => FailureClass::Unclassified,
        }
    }
}
