//! User configuration
//!
//! Stored in `~/.config/bkpaas/config.yaml`. Every field is optional.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Configuration file contents
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Directory holding local deployment/build records
    #[serde(default)]
    pub data_dir: Option<PathBuf>,

    /// Default user id for requests
    #[serde(default)]
    pub operator: Option<String>,

    /// Default namespace for cluster resources
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Log filter used when `RUST_LOG` is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_namespace() -> String {
    "default".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: None,
            operator: None,
            namespace: default_namespace(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Load configuration from default location
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let settings: Self = serde_yaml::from_str(&content)?;
        Ok(settings)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default configuration path
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| CoreError::InvalidConfig {
            message: "Could not determine config directory".to_string(),
        })?;
        Ok(config_dir.join("bkpaas").join("config.yaml"))
    }

    /// Directory for local records, falling back to the platform data dir
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("bkpaas")
        })
    }
}
