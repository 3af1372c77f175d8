//! Per-repository configuration for `rt`.

use crate::{constants::RT_CFG_FILE_NAME, git::Identity};
use anyhow::Result;
use git2::Repository;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Returns the path to the [RtConfig] for the given [Repository].
///
/// ## Takes
/// - `repository` - The repository to get the config path for.
///
/// ## Returns
/// - `PathBuf` - The path to the config file, inside the git directory. Bare
///   repositories keep it next to their refs.
pub fn config_path(repository: &Repository) -> PathBuf {
    repository.path().join(RT_CFG_FILE_NAME)
}

/// The configuration of `rt` for a single repository.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RtConfig {
    /// The remote branches are fetched from and pushed to.
    pub remote: String,
    /// Whether to fetch from and push to `remote` around each command. Disabling it
    /// keeps `rt` local.
    pub sync: bool,
    /// The author of landed commits.
    pub land: LandConfig,
}

impl Default for RtConfig {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            sync: true,
            land: LandConfig::default(),
        }
    }
}

/// The identity `rt` lands reviews as.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LandConfig {
    pub name: String,
    pub email: String,
}

impl Default for LandConfig {
    fn default() -> Self {
        Self {
            name: "rt".to_string(),
            email: "rt@localhost".to_string(),
        }
    }
}

impl LandConfig {
    pub fn identity(&self) -> Identity {
        Identity::new(&self.name, &self.email)
    }
}

impl RtConfig {
    /// Loads the config at `path`, falling back to the defaults if the file does not exist.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let config = toml::from_str(&std::fs::read_to_string(path)?)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Persists the config to `path`.
    pub fn write(&self, path: &Path) -> Result<()> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// The remote to synchronize with, if synchronization is enabled.
    pub fn sync_remote(&self) -> Option<&str> {
        self.sync.then_some(self.remote.as_str())
    }
}
