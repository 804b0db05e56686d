//! Mock store for testing
//!
//! Keeps every record in memory, useful for unit tests without a database.

use async_trait::async_trait;
use bkpaas_core::{Build, BuildProcess, Deployment, EnvironmentRef, JobStatus};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{BuildProcessStore, BuildStore, DeploymentStore, sort_by_creation};
use crate::error::{EngineError, Result};

/// In-memory store for testing
#[derive(Clone, Default)]
pub struct MockStore {
    deployments: Arc<RwLock<HashMap<String, Deployment>>>,
    /// Insertion order is creation order
    builds: Arc<RwLock<Vec<Build>>>,
    processes: Arc<RwLock<HashMap<String, BuildProcess>>>,
    /// Track operation counts for assertions
    operations: Arc<RwLock<OperationCounts>>,
}

/// Counts of operations performed for testing assertions
#[derive(Debug, Default, Clone)]
pub struct OperationCounts {
    pub gets: usize,
    pub lists: usize,
    pub creates: usize,
    pub updates: usize,
}

impl MockStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with pre-populated deployments
    pub fn with_deployments(deployments: Vec<Deployment>) -> Self {
        let store = Self::new();
        {
            let mut map = store.deployments.write().unwrap();
            for deployment in deployments {
                map.insert(deployment.id.clone(), deployment);
            }
        }
        store
    }

    /// Get operation counts for assertions
    pub fn operation_counts(&self) -> OperationCounts {
        self.operations.read().unwrap().clone()
    }

    /// Reset operation counts
    pub fn reset_counts(&self) {
        let mut ops = self.operations.write().unwrap();
        *ops = OperationCounts::default();
    }

    fn count(&self, f: impl FnOnce(&mut OperationCounts)) {
        let mut ops = self.operations.write().unwrap();
        f(&mut ops);
    }

    fn update_deployment(&self, id: &str, f: impl FnOnce(&mut Deployment)) -> Result<()> {
        self.count(|ops| ops.updates += 1);

        let mut map = self.deployments.write().unwrap();
        let deployment = map
            .get_mut(id)
            .ok_or_else(|| EngineError::DeploymentNotFound { id: id.to_string() })?;
        f(deployment);
        Ok(())
    }

    fn update_process(&self, id: &str, f: impl FnOnce(&mut BuildProcess)) -> Result<()> {
        self.count(|ops| ops.updates += 1);

        let mut map = self.processes.write().unwrap();
        let process = map
            .get_mut(id)
            .ok_or_else(|| EngineError::BuildProcessNotFound { id: id.to_string() })?;
        f(process);
        Ok(())
    }
}

#[async_trait]
impl DeploymentStore for MockStore {
    async fn get_deployment(&self, id: &str) -> Result<Deployment> {
        self.count(|ops| ops.gets += 1);

        let map = self.deployments.read().unwrap();
        map.get(id)
            .cloned()
            .ok_or_else(|| EngineError::DeploymentNotFound { id: id.to_string() })
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<()> {
        self.count(|ops| ops.creates += 1);

        let mut map = self.deployments.write().unwrap();
        if map.contains_key(&deployment.id) {
            return Err(EngineError::DeploymentAlreadyExists {
                id: deployment.id.clone(),
            });
        }
        map.insert(deployment.id.clone(), deployment.clone());
        Ok(())
    }

    async fn set_interruption_requested(
        &self,
        id: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<()> {
        self.update_deployment(id, |d| d.mark_interruption_requested(requested_at))
    }

    async fn set_status(&self, id: &str, status: JobStatus) -> Result<()> {
        self.update_deployment(id, |d| {
            d.status = status;
            d.updated_at = Utc::now();
        })
    }
}

#[async_trait]
impl BuildStore for MockStore {
    async fn create_build(&self, build: &Build) -> Result<()> {
        self.count(|ops| ops.creates += 1);
        self.builds.write().unwrap().push(build.clone());
        Ok(())
    }

    async fn list_builds(&self, env: &EnvironmentRef) -> Result<Vec<Build>> {
        self.count(|ops| ops.lists += 1);

        let mut builds: Vec<Build> = self
            .builds
            .read()
            .unwrap()
            .iter()
            .filter(|b| &b.env == env)
            .cloned()
            .collect();
        sort_by_creation(&mut builds);
        Ok(builds)
    }
}

#[async_trait]
impl BuildProcessStore for MockStore {
    async fn get_build_process(&self, id: &str) -> Result<BuildProcess> {
        self.count(|ops| ops.gets += 1);

        let map = self.processes.read().unwrap();
        map.get(id)
            .cloned()
            .ok_or_else(|| EngineError::BuildProcessNotFound { id: id.to_string() })
    }

    async fn create_build_process(&self, process: &BuildProcess) -> Result<()> {
        self.count(|ops| ops.creates += 1);
        self.processes
            .write()
            .unwrap()
            .insert(process.id.clone(), process.clone());
        Ok(())
    }

    async fn set_logs_ready(&self, id: &str, ready_at: DateTime<Utc>) -> Result<()> {
        self.update_process(id, |p| p.logs_ready_at = Some(ready_at))
    }

    async fn set_build_interruption_requested(
        &self,
        id: &str,
        requested_at: DateTime<Utc>,
    ) -> Result<()> {
        self.update_process(id, |p| p.int_requested_at = Some(requested_at))
    }
}
