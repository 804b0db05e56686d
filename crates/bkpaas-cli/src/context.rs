//! Resolved settings shared by all commands

use bkpaas_core::{Settings, User};
use bkpaas_engine::FileStore;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Settings after applying command line overrides
pub struct Context {
    pub settings: Settings,
    pub data_dir: PathBuf,
}

impl Context {
    /// Load the config file and apply `--data-dir`
    pub fn load(config: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Self> {
        let settings = match config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        let data_dir = data_dir.unwrap_or_else(|| settings.data_dir());
        Ok(Self { settings, data_dir })
    }

    /// Open the local record store
    pub fn store(&self) -> Result<FileStore> {
        Ok(FileStore::new(self.data_dir.clone())?)
    }

    /// Requesting user: explicit flag first, then the configured operator
    pub fn user(&self, explicit: Option<&str>) -> Result<User> {
        explicit
            .map(String::from)
            .or_else(|| self.settings.operator.clone())
            .map(User::new)
            .ok_or_else(|| {
                CliError::validation_with_help(
                    "no user given",
                    "Pass --user, set BKPAAS_USER, or set `operator` in the config file",
                )
            })
    }

    /// Namespace override or configured default
    pub fn namespace<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit.unwrap_or(&self.settings.namespace)
    }
}
