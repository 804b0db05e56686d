//! File-based store
//!
//! Keeps records as JSON files in a local directory:
//!
//! ```text
//! <base>/deployments/<id>.json
//! <base>/builds/<id>.json
//! <base>/build-processes/<id>.json
//! ```
//!
//! Writes go to a fresh temporary file that is renamed over the record, so a
//! reader never sees a half-written record. Read-modify-write updates hold
//! the store lock, which is shared by clones of the store.

use async_trait::async_trait;
use bkpaas_core::{Build, BuildProcess, Deployment, EnvironmentRef, JobStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tempfile::NamedTempFile;

use super::{BuildProcessStore, BuildStore, DeploymentStore, sort_by_creation};
use crate::error::{EngineError, Result};

const DEPLOYMENTS_DIR: &str = "deployments";
const BUILDS_DIR: &str = "builds";
const BUILD_PROCESSES_DIR: &str = "build-processes";

/// File-based store
#[derive(Clone)]
pub struct FileStore {
    /// Base directory for all records
    base_dir: PathBuf,
    /// Serializes updates made through this store and its clones
    lock: Arc<Mutex<()>>,
}

impl FileStore {
    /// Create a new file store
    pub fn new(base_dir: PathBuf) -> Result<Self> {
        for dir in [DEPLOYMENTS_DIR, BUILDS_DIR, BUILD_PROCESSES_DIR] {
            std::fs::create_dir_all(base_dir.join(dir))?;
        }
        Ok(Self {
            base_dir,
            lock: Arc::new(Mutex::new(())),
        })
    }

    /// Base directory of this store
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        // The guarded value is (), a panicking writer leaves nothing to repair
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_path(&self, dir: &str, id: &str) -> Result<PathBuf> {
        let valid =
            !id.is_empty() && id != "." && !id.contains("..") && !id.contains(['/', '\\']);
        if !valid {
            return Err(EngineError::InvalidRecordId { id: id.to_string() });
        }
        Ok(self.base_dir.join(dir).join(format!("{}.json", id)))
    }

    fn read_record<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read(path)?;
        Ok(Some(serde_json::from_slice(&data)?))
    }

    fn temp_record<T: Serialize>(path: &Path, record: &T) -> Result<NamedTempFile> {
        let data = serde_json::to_vec_pretty(record)?;
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&data)?;
        Ok(tmp)
    }

    fn write_record<T: Serialize>(path: &Path, record: &T) -> Result<()> {
        Self::temp_record(path, record)?
            .persist(path)
            .map_err(|e| e.error)?;
        Ok(())
    }

    /// Write a record that must not exist yet
    fn create_record<T: Serialize>(path: &Path, record: &T) -> Result<bool> {
        match Self::temp_record(path, record)?.persist_noclobber(path) {
            Ok(_) => Ok(true),
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.error.into()),
        }
    }

    fn read_deployment(&self, id: &str) -> Result<Deployment> {
        Self::read_record(&self.record_path(DEPLOYMENTS_DIR, id)?)?
            .ok_or_else(|| EngineError::DeploymentNotFound { id: id.to_string() })
    }

    fn update_deployment(&self, id: &str, f: impl FnOnce(&mut Deployment)) -> Result<()> {
        let _guard = self.guard();
        let mut deployment = self.read_deployment(id)?;
        f(&mut deployment);
        Self::write_record(&self.record_path(DEPLOYMENTS_DIR, id)?, &deployment)
    }

    fn read_process(&self, id: &str) -> Result<BuildProcess> {
        Self::read_record(&self.record_path(BUILD_PROCESSES_DIR, id)?)?
            .ok_or_else(|| EngineError::BuildProcessNotFound { id: id.to_string() })
    }

    fn update_process(&self, id: &str, f: impl FnOnce(&mut BuildProcess)) -> Result<()> {
        let _guard = self.guard();
        let mut process = self.read_process(id)?;
        f(&mut process);
        Self::write_record(&self.record_path(BUILD_PROCESSES_DIR, id)?, &process)
    }
}

#[async_trait]
impl DeploymentStore for FileStore {
    async fn get_deployment(&self, id: &str) -> Result<Deployment> {
        self.read_deployment(id)
    }

    async fn create_deployment(&self, deployment: &Deployment) -> Result<()> {
        let path = self.record_path(DEPLOYMENTS_DIR, &deployment.id)?;
        let _guard = self.guard();
        if !Self::create_record(&path, deployment)? {
            return Err(EngineError::DeploymentAlreadyExists {
                id: deployment.id.clone(),
            });
        }
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
impl BuildStore for FileStore {
    async fn create_build(&self, build: &Build) -> Result<()> {
        let path = self.record_path(BUILDS_DIR, &build.id)?;
        let _guard = self.guard();
        Self::write_record(&path, build)
    }

    async fn list_builds(&self, env: &EnvironmentRef) -> Result<Vec<Build>> {
        let mut builds = Vec::new();

        let mut paths: Vec<PathBuf> = std::fs::read_dir(self.base_dir.join(BUILDS_DIR))?
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
            .collect();
        // read_dir order is platform dependent
        paths.sort();

        for path in paths {
            if let Some(build) = Self::read_record::<Build>(&path)?
                && &build.env == env
            {
                builds.push(build);
            }
        }

        sort_by_creation(&mut builds);
        Ok(builds)
    }
}

#[async_trait]
impl BuildProcessStore for FileStore {
    async fn get_build_process(&self, id: &str) -> Result<BuildProcess> {
        self.read_process(id)
    }

    async fn create_build_process(&self, process: &BuildProcess) -> Result<()> {
        let path = self.record_path(BUILD_PROCESSES_DIR, &process.id)?;
        let _guard = self.guard();
        Self::write_record(&path, process)
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
