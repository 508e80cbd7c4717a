//! User configuration loading for irodori.
//!
//! User config location: $XDG_CONFIG_HOME/irodori/irodori.toml
//! Fallback: the platform config directory (`dirs::config_dir`).

use super::settings::SettingsFile;
use crate::error::{EngineError, EngineResult};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE_NAME: &str = "irodori.toml";

/// Returns the path to the user configuration file.
///
/// The path is determined by:
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/irodori/irodori.toml
/// 2. Otherwise: <platform config dir>/irodori/irodori.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Some(PathBuf::from(xdg_config).join("irodori").join(CONFIG_FILE_NAME));
    }
    dirs::config_dir().map(|dir| dir.join("irodori").join(CONFIG_FILE_NAME))
}

/// Read and parse one TOML settings layer.
pub fn load_settings_file(path: &Path) -> EngineResult<SettingsFile> {
    let contents = std::fs::read_to_string(path)?;
    toml::from_str(&contents)
        .map_err(|err| EngineError::config(format!("{}: {}", path.display(), err)))
}

/// Load the user configuration layer.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn load_user_config() -> EngineResult<Option<SettingsFile>> {
    let Some(path) = user_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_settings_file(&path).map(Some)
}
