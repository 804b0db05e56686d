//! CLI commands

pub mod autoscaling;
pub mod build;
pub mod deploy;
