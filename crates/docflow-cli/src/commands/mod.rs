//! Subcommand implementations.

pub mod batch;
pub mod classify;
pub mod config;
pub mod process;

use std::path::{Path, PathBuf};

use docflow_core::DocflowConfig;
use tracing::debug;

/// `<config_dir>/docflow/config.json`.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("docflow")
        .join("config.json")
}

/// Load the explicit config file, else the user config if present, else
/// the defaults.
pub fn load_config(path: Option<&str>) -> anyhow::Result<DocflowConfig> {
    let config = match path {
        Some(path) => DocflowConfig::from_file(Path::new(path))?,
        None => {
            let user = default_config_path();
            if user.exists() {
                debug!("Using config at {}", user.display());
                DocflowConfig::from_file(&user)?
            } else {
                DocflowConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}
