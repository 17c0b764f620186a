use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use paperstack_core::storage::XOCHITL_DIR;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// User settings, read from a JSON file.
///
/// Command-line flags (and their environment variables) take precedence over
/// the file, which takes precedence over the defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Document store directory.
    pub xochitl_dir: PathBuf,
    /// Command run after a document is pushed, e.g.
    /// `["ssh", "root@10.11.99.1", "systemctl", "restart", "xochitl"]`.
    pub restart_command: Option<Vec<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            xochitl_dir: PathBuf::from(XOCHITL_DIR),
            restart_command: None,
        }
    }
}

impl Settings {
    pub async fn from_file(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let settings = serde_json::from_str(&text)
            .with_context(|| format!("Invalid settings file {}", path.display()))?;
        debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Resolves the effective settings from an optional settings file and an
    /// optional store directory override.
    pub async fn load(config: Option<&Path>, xochitl_dir: Option<PathBuf>) -> Result<Self> {
        let mut settings = match config {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        if let Some(dir) = xochitl_dir {
            settings.xochitl_dir = dir;
        }
        Ok(settings)
    }
}
