//! BkPaaS Core - domain types shared by the deployment control crates
//!
//! This crate provides:
//! - `JobStatus`: lifecycle of deployments and build jobs
//! - `Deployment`: one build + release attempt, with interruption marks
//! - `Build` / `BuildProcess`: build artifacts and the processes producing them
//! - `AutoscalingConfig` / `ScalingObjectRef`: desired autoscaling policy of a process
//! - `Settings`: user configuration file

pub mod autoscaling;
pub mod build;
pub mod config;
pub mod deployment;
pub mod error;
pub mod status;

pub use autoscaling::{
    AutoscalingConfig, MetricResource, MetricTarget, ScalingMetric, ScalingObjectRef,
    ScalingPolicy,
};
pub use build::{Build, BuildProcess, Environment, EnvironmentRef};
pub use config::Settings;
pub use deployment::{Deployment, User};
pub use error::{CoreError, Result};
pub use status::JobStatus;
