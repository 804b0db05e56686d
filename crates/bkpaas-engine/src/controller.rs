//! Build process control
//!
//! The engine never stops a builder itself. It asks a [`BuildProcessController`]
//! to do so and relies on the controller tolerating repeated calls for the
//! same process.

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{EngineError, Result};
use crate::storage::BuildProcessStore;

/// Interrupts build processes by id
#[async_trait]
pub trait BuildProcessController: Send + Sync {
    /// Request the interruption of a build process
    ///
    /// Fails with [`EngineError::BuildNotStarted`] when the builder has not
    /// started yet. Any other error is reported as is.
    async fn interrupt(&self, process_id: &str) -> Result<()>;
}

/// Controller that records the request on the build process record
///
/// The builder watches `int_requested_at` and stops itself.
pub struct StoreBuildProcessController<S> {
    store: S,
}

impl<S: BuildProcessStore> StoreBuildProcessController<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

#[async_trait]
impl<S: BuildProcessStore> BuildProcessController for StoreBuildProcessController<S> {
    async fn interrupt(&self, process_id: &str) -> Result<()> {
        let process = self.store.get_build_process(process_id).await?;
        if !process.interruption_allowed() {
            return Err(EngineError::BuildNotStarted {
                process_id: process_id.to_string(),
            });
        }

        tracing::debug!(process_id, "recording build interruption request");
        self.store
            .set_build_interruption_requested(process_id, Utc::now())
            .await
    }
}
