//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid autoscaling config: {message}")]
    InvalidAutoscaling { message: String },

    #[error("Unknown environment '{name}' (expected 'stag' or 'prod')")]
    UnknownEnvironment { name: String },

    #[error("Invalid config file: {message}")]
    InvalidConfig { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
