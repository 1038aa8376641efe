use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::settings::Settings;

const APP_NAME: &str = "pagemark";
const PREFERENCES_FILENAME: &str = "preferences.json";
const SETTINGS_FILENAME: &str = "config.yaml";
const LOG_FILENAME: &str = "pagemark.log";

pub fn resolve_config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join(APP_NAME);
    Ok(dir.join(SETTINGS_FILENAME))
}

/// Where bookmarks are persisted: the configured file, or
/// `<data_dir>/pagemark/preferences.json`. Parent directories are created.
pub fn resolve_preferences_path(settings: &Settings) -> Result<PathBuf> {
    let path = match &settings.preferences_file {
        Some(path) => absolutize(path)?,
        None => dirs::data_dir()
            .context("Could not determine data directory")?
            .join(APP_NAME)
            .join(PREFERENCES_FILENAME),
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create data directory: {parent:?}"))?;
    }
    Ok(path)
}

/// Uses `state_dir` on platforms that have it, falls back to `cache_dir`.
pub fn resolve_log_path() -> Result<PathBuf> {
    let base = dirs::state_dir()
        .or_else(dirs::cache_dir)
        .context("Could not determine state or cache directory")?;
    log_path_under(&base)
}

/// `<base>/pagemark/pagemark.log`, creating the directory.
fn log_path_under(base: &Path) -> Result<PathBuf> {
    let log_dir = base.join(APP_NAME);
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory: {log_dir:?}"))?;

    Ok(log_dir.join(LOG_FILENAME))
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()
            .context("Failed to get current directory")?
            .join(path))
    }
}
