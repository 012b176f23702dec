//! Cross-Platform Path Utilities
//!
//! Resolves the engine's configuration directory (`<config dir>/insight-engine/`).

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

const APP_DIR_NAME: &str = "insight-engine";

/// Get the engine configuration directory
pub fn app_config_dir() -> AppResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| AppError::config("Could not determine config directory"))
}

/// Get the config file path (`<config dir>/insight-engine/config.json`)
pub fn config_path() -> AppResult<PathBuf> {
    Ok(app_config_dir()?.join("config.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
