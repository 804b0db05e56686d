//! Persistence contracts for deployment records
//!
//! Records are owned by the deployment-tracking subsystem. The engine only
//! reads them and updates a few named fields, so the traits expose
//! field-level updates instead of whole-record saves. Every update must be
//! atomic for a single record.
//!
//! Two drivers are provided:
//! - **Mock**: in-memory, for tests
//! - **File**: JSON files in a local directory, for the CLI and offline use

mod file;
mod mock;

pub use file::FileStore;
pub use mock::{MockStore, OperationCounts};

use async_trait::async_trait;
use bkpaas_core::{Build, BuildProcess, Deployment, EnvironmentRef, JobStatus};
use chrono::{DateTime, Utc};

use crate::error::{EngineError, Result};

/// Deployment record persistence
///
/// Implementations must be Send + Sync for use across async tasks.
#[async_trait]
pub trait DeploymentStore: Send + Sync {
    /// Get a deployment by id
    async fn get_deployment(&self, id: &str) -> Result<Deployment>;

    /// Create a new deployment record
    async fn create_deployment(&self, deployment: &Deployment) -> Result<()>;

    /// Set both interruption marks and `updated_at` to `requested_at`
    async fn set_interruption_requested(&self, id: &str, requested_at: DateTime<Utc>)
    -> Result<()>;

    /// Set the status and `updated_at` (used by executors)
    async fn set_status(&self, id: &str, status: JobStatus) -> Result<()>;

    /// Check if a deployment exists
    async fn deployment_exists(&self, id: &str) -> Result<bool> {
        match self.get_deployment(id).await {
            Ok(_) => Ok(true),
            Err(EngineError::DeploymentNotFound { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

/// Build record lookup
#[async_trait]
pub trait BuildStore: Send + Sync {
    /// Record a new build
    async fn create_build(&self, build: &Build) -> Result<()>;

    /// All builds of an environment, oldest first
    async fn list_builds(&self, env: &EnvironmentRef) -> Result<Vec<Build>>;
}

/// Build process persistence
#[async_trait]
pub trait BuildProcessStore: Send + Sync {
    /// Get a build process by id
    async fn get_build_process(&self, id: &str) -> Result<BuildProcess>;

    /// Record a new build process
    async fn create_build_process(&self, process: &BuildProcess) -> Result<()>;

    /// Mark the builder as started
    async fn set_logs_ready(&self, id: &str, ready_at: DateTime<Utc>) -> Result<()>;

    /// Set the interruption mark of a build process
    async fn set_build_interruption_requested(
        &self,
        id: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Order builds by creation time, keeping the given order for ties
pub(crate) fn sort_by_creation(builds: &mut [Build]) {
    builds.sort_by_key(|b| b.created_at);
}
