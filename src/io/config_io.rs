use std::fs;
use std::path::{Path, PathBuf};

use crate::model::config::AppConfig;

pub const CONFIG_FILE_NAME: &str = "trellis.toml";

/// Error type for configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not read {}: {source}", .path.display())]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", .path.display())]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
}

/// Read and parse a config file. Missing fields take their defaults.
pub fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load the session config: an explicit path must exist; otherwise
/// `trellis.toml` in `dir` is used when present, else built-in defaults.
pub fn load_config(explicit: Option<&Path>, dir: &Path) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit {
        return read_config(path);
    }
    let candidate = dir.join(CONFIG_FILE_NAME);
    if candidate.is_file() {
        log::debug!("using config {}", candidate.display());
        return read_config(&candidate);
    }
    Ok(AppConfig::default())
}
