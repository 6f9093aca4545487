//! Path utilities for chorus-sync configuration files

use std::path::PathBuf;

/// Get the default config directory
///
/// Returns: `~/.config/chorus-sync` (or the platform equivalent)
pub fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("chorus-sync")
}

/// Get the default config file path
///
/// Returns: `~/.config/chorus-sync/config.yaml`
pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}
