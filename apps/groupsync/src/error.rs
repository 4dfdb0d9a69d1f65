//! CLI error types and process exit codes.
//!
//! The exit codes are a fixed contract with the operators who schedule
//! this job:
//! - 0: success
//! - 101: authentication failure (acquisition failed or refresh ceiling reached)
//! - 102: configuration fetch failure
//! - 103: validation failure
//! - 104: membership resolution failure
//! - 105: member-add failure
//! - 106: member-remove failure
//! - 300: unclassified failure

use thiserror::Error;

use groupsync_engine::{EngineError, FailureClass};

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Configuration fetch failed: {0}")]
    ConfigFetch(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Membership resolution failed: {0}")]
    Resolve(String),

    #[error("Member add failed: {0}")]
    AddMembers(String),

    #[error("Member remove failed: {0}")]
    RemoveMember(String),

    #[error("{0}")]
    Unclassified(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        exit_code_for(match self {
            CliError::Auth(_) => FailureClass::Auth,
            CliError::ConfigFetch(_) => FailureClass::ConfigFetch,
            CliError::Validation(_) => FailureClass::Validation,
            CliError::Resolve(_) => FailureClass::Resolve,
            CliError::AddMembers(_) => FailureClass::AddMembers,
            CliError::RemoveMember(_) => FailureClass::RemoveMember,
            CliError::Unclassified(_) => FailureClass::Unclassified,
        })
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let message = err.to_string();
        match err.class() {
            FailureClass::Auth => CliError::Auth(message),
            FailureClass::ConfigFetch => CliError::ConfigFetch(message),
            FailureClass::Validation => CliError::Validation(message),
            FailureClass::Resolve => CliError::Resolve(message),
            FailureClass::AddMembers => CliError::AddMembers(message),
            FailureClass::RemoveMember => CliError::RemoveMember(message),
            FailureClass::Unclassified => CliError::Unclassified(message),
        }
    }
}

/// Maps a failure class to its operator-facing exit code.
pub fn exit_code_for(class: FailureClass) -> i32 {
    match class {
        FailureClass::Auth => 101,
        FailureClass::ConfigFetch => 102,
        FailureClass::Validation => 103,
        FailureClass::Resolve => 104,
        FailureClass::AddMembers => 105,
        FailureClass::RemoveMember => 106,
        FailureClass::Unclassified => 300,
    }
}
