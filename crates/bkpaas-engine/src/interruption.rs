//! Cooperative interruption of deployments
//!
//! Interrupting never guarantees that a deployment stops, immediately or at
//! all. What happens depends on the phase:
//!
//! - **Build phase**: the build process controller is asked to stop the builder
//! - **Release phase**: `release_int_requested_at` is set, and the release
//!   poller aborts when it sees the mark on its next tick
//!
//! Both marks are always written together, before the controller is called,
//! and are never rolled back.

use bkpaas_core::{Deployment, User};
use chrono::Utc;

use crate::controller::BuildProcessController;
use crate::error::{EngineError, InvalidState, Result};
use crate::storage::DeploymentStore;

/// Requests interruptions of running deployments
pub struct DeployInterruptionCoordinator<D, C> {
    deployments: D,
    controller: C,
}

impl<D: DeploymentStore, C: BuildProcessController> DeployInterruptionCoordinator<D, C> {
    pub fn new(deployments: D, controller: C) -> Self {
        Self {
            deployments,
            controller,
        }
    }

    /// Get the deployment store
    pub fn deployments(&self) -> &D {
        &self.deployments
    }

    /// Get the build process controller
    pub fn controller(&self) -> &C {
        &self.controller
    }

    /// Request the interruption of `deployment` on behalf of `user`
    ///
    /// On success the interruption has been *requested*. The caller must not
    /// assume the deployment has stopped.
    pub async fn interrupt(&self, deployment: &mut Deployment, user: &User) -> Result<()> {
        if !deployment.is_operated_by(user) {
            return Err(EngineError::Unauthorized {
                message: "cannot interrupt a deployment started by another user".to_string(),
            });
        }
        if deployment.is_finished() {
            return Err(EngineError::InvalidState(InvalidState::DeploymentFinished));
        }

        let now = Utc::now();
        self.deployments
            .set_interruption_requested(&deployment.id, now)
            .await?;
        deployment.mark_interruption_requested(now);

        tracing::info!(
            deployment = %deployment.id,
            user = %user.id,
            status = %deployment.status,
            "deployment interruption requested"
        );

        let Some(process_id) = deployment.build_process_id.as_deref() else {
            return Ok(());
        };

        tracing::debug!(deployment = %deployment.id, process_id, "interrupting build process");
        match self.controller.interrupt(process_id).await {
            Ok(()) => Ok(()),
            Err(EngineError::BuildNotStarted { .. }) => {
                tracing::warn!(
                    deployment = %deployment.id,
                    process_id,
                    "build process not started yet, asking caller to retry"
                );
                Err(EngineError::InvalidState(InvalidState::BuildPreparing))
            }
            Err(e) => Err(e),
        }
    }

    /// Load a deployment and request its interruption
    ///
    /// Returns the deployment as it looks after the request.
    pub async fn interrupt_by_id(&self, deployment_id: &str, user: &User) -> Result<Deployment> {
        let mut deployment = self.deployments.get_deployment(deployment_id).await?;
        self.interrupt(&mut deployment, user).await?;
        Ok(deployment)
    }
}

/// Check whether the release phase of a deployment should abort
///
/// Release pollers call this on every tick. Once it returns `true` the poller
/// must not apply any further release side effect.
pub async fn release_abort_requested<D: DeploymentStore + ?Sized>(
    deployments: &D,
    deployment_id: &str,
) -> Result<bool> {
    let deployment = deployments.get_deployment(deployment_id).await?;
    Ok(deployment.release_interruption_requested())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MockStore;
    use async_trait::async_trait;
    use bkpaas_core::{Environment, EnvironmentRef, JobStatus};
    use std::sync::{Arc, Mutex};

    /// What the test controller answers
    #[derive(Clone, Copy)]
    enum Outcome {
        Ok,
        NotStarted,
        Missing,
    }

    /// Controller recording every call
    #[derive(Clone)]
    struct RecordingController {
        outcome: Outcome,
        calls: Arc<Mutex<Vec<String>>>,
    }

    impl RecordingController {
        fn new(outcome: Outcome) -> Self {
            Self {
                outcome,
                calls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl BuildProcessController for RecordingController {
        async fn interrupt(&self, process_id: &str) -> Result<()> {
            self.calls.lock().unwrap().push(process_id.to_string());
            match self.outcome {
                Outcome::Ok => Ok(()),
                Outcome::NotStarted => Err(EngineError::BuildNotStarted {
                    process_id: process_id.to_string(),
                }),
                Outcome::Missing => Err(EngineError::BuildProcessNotFound {
                    id: process_id.to_string(),
                }),
            }
        }
    }

    const ALL_STATUSES: [JobStatus; 6] = [
        JobStatus::Pending,
        JobStatus::Building,
        JobStatus::Releasing,
        JobStatus::Successful,
        JobStatus::Failed,
        JobStatus::Interrupted,
    ];

    fn deployment(status: JobStatus, build_process_id: Option<&str>) -> Deployment {
        let mut d = Deployment::new(
            "d-1",
            EnvironmentRef::new("demo", "default", Environment::Stag),
            "alice",
        );
        d.status = status;
        d.build_process_id = build_process_id.map(String::from);
        d
    }

    fn coordinator(
        d: &Deployment,
        outcome: Outcome,
    ) -> DeployInterruptionCoordinator<MockStore, RecordingController> {
        DeployInterruptionCoordinator::new(
            MockStore::with_deployments(vec![d.clone()]),
            RecordingController::new(outcome),
        )
    }

    #[tokio::test]
    async fn test_other_user_is_unauthorized_in_any_status() {
        for status in ALL_STATUSES {
            let mut d = deployment(status, Some("bp-1"));
            let coordinator = coordinator(&d, Outcome::Ok);

            let result = coordinator.interrupt(&mut d, &User::new("bob")).await;
            assert!(
                matches!(result, Err(EngineError::Unauthorized { .. })),
                "status {status} should be unauthorized"
            );
            assert!(d.build_int_requested_at.is_none());
            assert!(coordinator.controller().calls().is_empty());
            assert_eq!(coordinator.deployments().operation_counts().updates, 0);
        }
    }

    #[tokio::test]
    async fn test_finished_deployment_is_invalid_state() {
        for status in JobStatus::finished_states() {
            let mut d = deployment(*status, Some("bp-1"));
            let coordinator = coordinator(&d, Outcome::Ok);

            let result = coordinator.interrupt(&mut d, &User::new("alice")).await;
            assert!(matches!(
                result,
                Err(EngineError::InvalidState(InvalidState::DeploymentFinished))
            ));

            let stored = coordinator.deployments().get_deployment("d-1").await.unwrap();
            assert!(stored.release_int_requested_at.is_none());
            assert!(coordinator.controller().calls().is_empty());
        }
    }

    #[tokio::test]
    async fn test_interrupt_without_build_process() {
        let mut d = deployment(JobStatus::Pending, None);
        let coordinator = coordinator(&d, Outcome::Ok);

        coordinator
            .interrupt(&mut d, &User::new("alice"))
            .await
            .unwrap();

        let stored = coordinator.deployments().get_deployment("d-1").await.unwrap();
        assert!(stored.build_int_requested_at.is_some());
        assert_eq!(stored.build_int_requested_at, stored.release_int_requested_at);
        assert_eq!(stored.updated_at, stored.build_int_requested_at.unwrap());
        assert_eq!(d.build_int_requested_at, stored.build_int_requested_at);
        assert!(coordinator.controller().calls().is_empty());
    }

    #[tokio::test]
    async fn test_interrupt_calls_controller_once() {
        let mut d = deployment(JobStatus::Building, Some("bp-1"));
        let coordinator = coordinator(&d, Outcome::Ok);

        coordinator
            .interrupt(&mut d, &User::new("alice"))
            .await
            .unwrap();

        assert_eq!(coordinator.controller().calls(), vec!["bp-1".to_string()]);
        assert!(d.release_interruption_requested());
    }

    #[tokio::test]
    async fn test_not_started_becomes_retry_hint_without_rollback() {
        let mut d = deployment(JobStatus::Building, Some("bp-1"));
        let coordinator = coordinator(&d, Outcome::NotStarted);

        let err = coordinator
            .interrupt(&mut d, &User::new("alice"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::InvalidState(InvalidState::BuildPreparing)
        ));
        assert!(err.is_retriable());
        assert!(err.to_string().contains("retry shortly"));
        assert_eq!(coordinator.controller().calls().len(), 1);

        let stored = coordinator.deployments().get_deployment("d-1").await.unwrap();
        assert!(stored.build_int_requested_at.is_some());
        assert_eq!(stored.build_int_requested_at, stored.release_int_requested_at);
    }

    #[tokio::test]
    async fn test_other_controller_errors_pass_through() {
        let mut d = deployment(JobStatus::Building, Some("bp-1"));
        let coordinator = coordinator(&d, Outcome::Missing);

        let result = coordinator.interrupt(&mut d, &User::new("alice")).await;
        assert!(matches!(
            result,
            Err(EngineError::BuildProcessNotFound { .. })
        ));
        assert!(d.build_int_requested_at.is_some());
    }

    #[tokio::test]
    async fn test_repeated_interrupts_are_accepted() {
        let mut d = deployment(JobStatus::Releasing, Some("bp-1"));
        let coordinator = coordinator(&d, Outcome::Ok);
        let user = User::new("alice");

        coordinator.interrupt(&mut d, &user).await.unwrap();
        let first = d.release_int_requested_at.unwrap();
        coordinator.interrupt(&mut d, &user).await.unwrap();

        assert!(d.release_int_requested_at.unwrap() >= first);
        assert_eq!(coordinator.controller().calls().len(), 2);
    }

    #[tokio::test]
    async fn test_interrupt_by_id_and_release_abort_check() {
        let d = deployment(JobStatus::Releasing, None);
        let coordinator = coordinator(&d, Outcome::Ok);

        assert!(
            !release_abort_requested(coordinator.deployments(), "d-1")
                .await
                .unwrap()
        );

        let updated = coordinator
            .interrupt_by_id("d-1", &User::new("alice"))
            .await
            .unwrap();
        assert!(updated.release_interruption_requested());
        assert!(
            release_abort_requested(coordinator.deployments(), "d-1")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_interrupt_by_id_missing() {
        let d = deployment(JobStatus::Pending, None);
        let coordinator = coordinator(&d, Outcome::Ok);

        let result = coordinator
            .interrupt_by_id("other", &User::new("alice"))
            .await;
        assert!(matches!(result, Err(EngineError::DeploymentNotFound { .. })));
    }
}
