//! Environments, builds and build processes

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::CoreError;

/// Deployment environment of a module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Stag,
    #[default]
    Prod,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Stag => "stag",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stag" => Ok(Self::Stag),
            "prod" => Ok(Self::Prod),
            other => Err(CoreError::UnknownEnvironment {
                name: other.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handle of one environment of an application module
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentRef {
    pub app_code: String,
    pub module: String,
    pub environment: Environment,
}

impl EnvironmentRef {
    pub fn new(app_code: impl Into<String>, module: impl Into<String>, environment: Environment) -> Self {
        Self {
            app_code: app_code.into(),
            module: module.into(),
            environment,
        }
    }
}

impl std::fmt::Display for EnvironmentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.app_code, self.module, self.environment)
    }
}

/// A build artifact produced for an environment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Build {
    pub id: String,
    pub env: EnvironmentRef,
    pub created_at: DateTime<Utc>,
}

impl Build {
    pub fn new(id: impl Into<String>, env: EnvironmentRef) -> Self {
        Self {
            id: id.into(),
            env,
            created_at: Utc::now(),
        }
    }
}

/// A running (or finished) build job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildProcess {
    pub id: String,

    pub env: EnvironmentRef,

    /// Set once the builder started and began streaming logs
    #[serde(default)]
    pub logs_ready_at: Option<DateTime<Utc>>,

    /// When an interruption was requested
    #[serde(default)]
    pub int_requested_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl BuildProcess {
    pub fn new(id: impl Into<String>, env: EnvironmentRef) -> Self {
        Self {
            id: id.into(),
            env,
            logs_ready_at: None,
            int_requested_at: None,
            created_at: Utc::now(),
        }
    }

    /// A build process may only be interrupted once the builder has started
    pub fn interruption_allowed(&self) -> bool {
        self.logs_ready_at.is_some()
    }
}
