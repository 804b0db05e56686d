//! Deployment records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::build::EnvironmentRef;
use crate::status::JobStatus;

/// A platform user issuing requests
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct User {
    pub id: String,
}

impl User {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// One attempt to build and release an application version
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deployment {
    /// Unique deployment id
    pub id: String,

    /// Environment being deployed
    pub env: EnvironmentRef,

    /// Id of the user who started the deployment
    pub operator: String,

    /// Current status, owned by the build/release executors
    #[serde(default)]
    pub status: JobStatus,

    /// Handle of the build process, set once the build phase is reached
    #[serde(default)]
    pub build_process_id: Option<String>,

    /// When an interruption of the build phase was requested
    #[serde(default)]
    pub build_int_requested_at: Option<DateTime<Utc>>,

    /// When an interruption of the release phase was requested
    #[serde(default)]
    pub release_int_requested_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Deployment {
    /// Create a pending deployment
    pub fn new(id: impl Into<String>, env: EnvironmentRef, operator: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            env,
            operator: operator.into(),
            status: JobStatus::Pending,
            build_process_id: None,
            build_int_requested_at: None,
            release_int_requested_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the deployment reached a terminal status
    pub fn is_finished(&self) -> bool {
        self.status.is_finished()
    }

    /// Check if `user` started this deployment
    pub fn is_operated_by(&self, user: &User) -> bool {
        self.operator == user.id
    }

    /// Whether a release poller should abort
    pub fn release_interruption_requested(&self) -> bool {
        self.release_int_requested_at.is_some()
    }

    /// Record an interruption request for both phases
    pub fn mark_interruption_requested(&mut self, at: DateTime<Utc>) {
        self.build_int_requested_at = Some(at);
        self.release_int_requested_at = Some(at);
        self.updated_at = at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::Environment;

    fn deployment() -> Deployment {
        Deployment::new(
            "d-1",
            EnvironmentRef::new("demo", "default", Environment::Stag),
            "alice",
        )
    }

    #[test]
    fn test_new_deployment_is_pending() {
        let d = deployment();
        assert_eq!(d.status, JobStatus::Pending);
        assert!(!d.is_finished());
        assert!(!d.release_interruption_requested());
    }

    #[test]
    fn test_mark_interruption_requested_sets_both_marks() {
        let mut d = deployment();
        let now = Utc::now();
        d.mark_interruption_requested(now);

        assert_eq!(d.build_int_requested_at, Some(now));
        assert_eq!(d.release_int_requested_at, Some(now));
        assert_eq!(d.updated_at, now);
        assert!(d.release_interruption_requested());
    }

    #[test]
    fn test_operator_check() {
        let d = deployment();
        assert!(d.is_operated_by(&User::new("alice")));
        assert!(!d.is_operated_by(&User::new("bob")));
    }

    #[test]
    fn test_json_field_names() {
        let d = deployment();
        let value = serde_json::to_value(&d).unwrap();
        assert!(value.get("buildProcessId").is_some());
        assert!(value.get("releaseIntRequestedAt").is_some());
        assert_eq!(value["status"], "pending");
    }
}
