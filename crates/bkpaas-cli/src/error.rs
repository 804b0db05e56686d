//! CLI error types with exit code handling
//!
//! This module provides a unified error type for CLI operations that
//! maps errors to appropriate exit codes.

use bkpaas_core::CoreError;
use bkpaas_engine::EngineError;
use bkpaas_kube::KubeError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic)]
pub enum CliError {
    /// Invalid input (bad file, malformed resource, missing argument)
    #[error("Validation failed: {message}")]
    #[diagnostic(code(bkpaas::cli::validation))]
    Validation {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// The user may not act on the target
    #[error("Unauthorized: {message}")]
    #[diagnostic(code(bkpaas::cli::unauthorized))]
    Unauthorized { message: String },

    /// The target is in a state that does not allow the operation
    #[error("{message}")]
    #[diagnostic(code(bkpaas::cli::invalid_state))]
    InvalidState {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// A record does not exist
    #[error("{message}")]
    #[diagnostic(code(bkpaas::cli::not_found))]
    NotFound { message: String },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(bkpaas::cli::io))]
    Io { message: String },

    /// Wrapped error for passthrough (stores the formatted message)
    #[error("{message}")]
    #[diagnostic(code(bkpaas::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Validation { .. } => exit_codes::VALIDATION_ERROR,
            CliError::Unauthorized { .. } => exit_codes::UNAUTHORIZED,
            CliError::InvalidState { .. } => exit_codes::INVALID_STATE,
            CliError::NotFound { .. } => exit_codes::ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: None,
        }
    }

    /// Create a validation error with help text
    pub fn validation_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            help: Some(help.into()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Io(e) => e.into(),
            other => CliError::validation(other.to_string()),
        }
    }
}

impl From<EngineError> for CliError {
    fn from(err: EngineError) -> Self {
        let retriable = err.is_retriable();
        match err {
            EngineError::Unauthorized { message } => CliError::Unauthorized { message },
            e @ EngineError::InvalidRecordId { .. } => CliError::validation(e.to_string()),
            EngineError::InvalidState(state) => CliError::InvalidState {
                message: state.to_string(),
                help: retriable.then(|| "Run the same command again in a few seconds".to_string()),
            },
            e if e.is_not_found() => CliError::NotFound {
                message: e.to_string(),
            },
            EngineError::Io(e) => e.into(),
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

impl From<KubeError> for CliError {
    fn from(err: KubeError) -> Self {
        match err {
            KubeError::MalformedResource { .. } | KubeError::InvalidEntity(_) => {
                CliError::validation(err.to_string())
            }
            other => CliError::Other {
                message: other.to_string(),
            },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use bkpaas_engine::InvalidState;

    #[test]
    fn test_engine_error_exit_codes() {
        let unauthorized: CliError = EngineError::Unauthorized {
            message: "nope".to_string(),
        }
        .into();
        assert_eq!(unauthorized.exit_code(), exit_codes::UNAUTHORIZED);

        let finished: CliError = EngineError::InvalidState(InvalidState::DeploymentFinished).into();
        assert_eq!(finished.exit_code(), exit_codes::INVALID_STATE);
        assert!(matches!(finished, CliError::InvalidState { help: None, .. }));

        let preparing: CliError = EngineError::InvalidState(InvalidState::BuildPreparing).into();
        assert!(matches!(preparing, CliError::InvalidState { help: Some(_), .. }));

        let bad_id: CliError = EngineError::InvalidRecordId {
            id: "../x".to_string(),
        }
        .into();
        assert_eq!(bad_id.exit_code(), exit_codes::VALIDATION_ERROR);
    }

    #[test]
    fn test_malformed_resource_is_validation() {
        let err: CliError = KubeError::malformed("GeneralPodAutoscaler", "missing kind").into();
        assert_eq!(err.exit_code(), exit_codes::VALIDATION_ERROR);
    }
}
