use cid_schema::ChecksumVariant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// User defaults, read from `~/.config/cid/config.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Checksum variant used when a command is not given one explicitly.
    pub variant: ChecksumVariant,
}

impl CliConfig {
    /// Load an explicit config file, or the default one if it exists.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, String> {
        match explicit {
            Some(path) => Self::load(path),
            None => Self::load_default(),
        }
    }

    pub fn load_default() -> Result<Self, String> {
        match default_config_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("failed to read config {}: {e}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| format!("invalid config {}: {e}", path.display()))?;
        tracing::debug!("loaded config from {}", path.display());
        Ok(config)
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/cid/config.json"))
}
