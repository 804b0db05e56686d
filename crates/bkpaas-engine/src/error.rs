//! Error types for bkpaas-engine

use thiserror::Error;

/// Result type for bkpaas-engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors that can occur while controlling deployments
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The requesting user may not act on this deployment
    #[error("unauthorized: {message}")]
    Unauthorized { message: String },

    /// The deployment is not in a state that allows the operation
    #[error("{0}")]
    InvalidState(InvalidState),

    /// The build process exists but its builder has not started yet
    #[error("build process '{process_id}' has not started yet")]
    BuildNotStarted { process_id: String },

    /// Deployment not found
    #[error("deployment '{id}' not found")]
    DeploymentNotFound { id: String },

    /// Deployment already exists
    #[error("deployment '{id}' already exists")]
    DeploymentAlreadyExists { id: String },

    /// Build process not found
    #[error("build process '{id}' not found")]
    BuildProcessNotFound { id: String },

    /// A record id that cannot name a record file
    #[error("invalid record id '{id}'")]
    InvalidRecordId { id: String },

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a deployment cannot be acted on right now
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidState {
    /// The deployment already reached a finished status
    DeploymentFinished,
    /// The build is still being prepared, the caller should retry shortly
    BuildPreparing,
}

impl InvalidState {
    pub fn message(&self) -> &'static str {
        match self {
            Self::DeploymentFinished => "cannot interrupt, deployment already finished",
            Self::BuildPreparing => {
                "build is in preparatory state, cannot interrupt yet, please retry shortly"
            }
        }
    }
}

impl std::fmt::Display for InvalidState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Serialization(e.to_string())
    }
}

impl EngineError {
    /// Check if retrying the same request later may succeed
    pub fn is_retriable(&self) -> bool {
        matches!(self, EngineError::InvalidState(InvalidState::BuildPreparing))
    }

    /// Check if this is a not-found error
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::DeploymentNotFound { .. } | EngineError::BuildProcessNotFound { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_messages() {
        let finished = EngineError::InvalidState(InvalidState::DeploymentFinished);
        assert!(finished.to_string().contains("already finished"));
        assert!(!finished.is_retriable());

        let preparing = EngineError::InvalidState(InvalidState::BuildPreparing);
        assert!(preparing.to_string().contains("retry shortly"));
        assert!(preparing.is_retriable());
    }
}
