//! Job status shared by deployments and build processes

use serde::{Deserialize, Serialize};

/// Status of a deployment (or any job driven by the engine)
///
/// Only the build/release executors move a job between states. Everything
/// else treats the status as read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Created, waiting for a builder
    #[default]
    Pending,
    /// Build phase is running
    Building,
    /// Release phase is running
    Releasing,
    /// Finished successfully
    Successful,
    /// Finished with an error
    Failed,
    /// Stopped after an interruption request
    Interrupted,
}

const FINISHED_STATES: [JobStatus; 3] = [
    JobStatus::Successful,
    JobStatus::Failed,
    JobStatus::Interrupted,
];

impl JobStatus {
    /// States from which a job never moves again
    pub fn finished_states() -> &'static [JobStatus] {
        &FINISHED_STATES
    }

    /// Check if this status is terminal
    pub fn is_finished(&self) -> bool {
        Self::finished_states().contains(self)
    }

    /// Lowercase status name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Building => "building",
            Self::Releasing => "releasing",
            Self::Successful => "successful",
            Self::Failed => "failed",
            Self::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finished_states() {
        assert!(JobStatus::Successful.is_finished());
        assert!(JobStatus::Failed.is_finished());
        assert!(JobStatus::Interrupted.is_finished());

        assert!(!JobStatus::Pending.is_finished());
        assert!(!JobStatus::Building.is_finished());
        assert!(!JobStatus::Releasing.is_finished());
    }

    #[test]
    fn test_serde_lowercase() {
        let json = serde_json::to_string(&JobStatus::Releasing).unwrap();
        assert_eq!(json, "\"releasing\"");

        let status: JobStatus = serde_json::from_str("\"interrupted\"").unwrap();
        assert_eq!(status, JobStatus::Interrupted);
    }
}
