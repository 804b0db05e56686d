//! BkPaaS Engine - deployment lifecycle control
//!
//! This crate provides:
//! - **Storage**: field-level persistence contracts for deployments, builds and
//!   build processes, with in-memory and file-backed implementations
//! - **Build control**: the contract for interrupting a build process
//! - **Interruption**: cooperative interruption of a running deployment
//! - **Build lookup**: resolve the latest build of an environment

pub mod controller;
pub mod error;
pub mod interruption;
pub mod resolver;
pub mod storage;

pub use controller::{BuildProcessController, StoreBuildProcessController};
pub use error::{EngineError, InvalidState, Result};
pub use interruption::{DeployInterruptionCoordinator, release_abort_requested};
pub use resolver::LatestBuildResolver;
pub use storage::{
    BuildProcessStore, BuildStore, DeploymentStore, FileStore, MockStore, OperationCounts,
};
