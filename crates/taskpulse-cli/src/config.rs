use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use taskpulse_core::EngineConfig;

/// `~/.config/taskpulse/config.toml`
fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".config").join("taskpulse").join("config.toml"))
}

/// An explicit path must exist; the default location is optional.
pub fn load_engine_config(explicit: Option<&Path>) -> Result<EngineConfig> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => match config_path() {
            Some(path) if path.exists() => path,
            _ => return Ok(EngineConfig::default()),
        },
    };

    let content = fs::read_to_string(&path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    EngineConfig::from_toml_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))
}
