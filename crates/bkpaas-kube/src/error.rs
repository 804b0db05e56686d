//! Error types for bkpaas-kube

use thiserror::Error;

/// Result type for bkpaas-kube operations
pub type Result<T> = std::result::Result<T, KubeError>;

/// Errors that can occur while mapping or syncing cluster resources
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum KubeError {
    /// Kubernetes API error
    #[error("Kubernetes API error: {0}")]
    Api(#[from] kube::Error),

    /// A cluster document lacks required fields or has the wrong shape
    #[error("malformed {kind} resource: {reason}")]
    MalformedResource { kind: String, reason: String },

    /// The entity cannot be represented (invalid desired state)
    #[error("invalid entity: {0}")]
    InvalidEntity(String),
}

impl From<bkpaas_core::CoreError> for KubeError {
    fn from(e: bkpaas_core::CoreError) -> Self {
        KubeError::InvalidEntity(e.to_string())
    }
}

impl KubeError {
    /// Shorthand for a malformed resource error
    pub fn malformed(kind: &str, reason: impl Into<String>) -> Self {
        KubeError::MalformedResource {
            kind: kind.to_string(),
            reason: reason.into(),
        }
    }

    /// Check if this is a Kubernetes 404 Not Found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 404)
    }

    /// Check if this is a conflict error (409)
    pub fn is_conflict(&self) -> bool {
        matches!(self, KubeError::Api(kube::Error::Api(resp)) if resp.code == 409)
    }
}
