//! YAML configuration I/O
//!
//! Generic loading and saving for any serializable configuration type.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Read and parse a YAML file, failing on any I/O or syntax problem
pub fn read_config<T>(path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let contents =
        std::fs::read_to_string(path).with_context(|| format!("reading {:?}", path))?;
    serde_yaml::from_str(&contents).with_context(|| format!("parsing {:?}", path))
}

/// Load a config, falling back to defaults
///
/// A missing file means defaults. An unreadable or malformed one is logged
/// and replaced by defaults as well.
pub fn load_config<T>(path: &Path) -> T
where
    T: DeserializeOwned + Default,
{
    if !path.exists() {
        log::info!("load_config: no config at {:?}, using defaults", path);
        return T::default();
    }

    read_config(path).unwrap_or_else(|e| {
        log::warn!("load_config: {:#}, using defaults", e);
        T::default()
    })
}

/// Write a config as YAML, creating missing parent directories
pub fn save_config<T>(config: &T, path: &Path) -> Result<()>
where
    T: Serialize,
{
    let yaml = serde_yaml::to_string(config).context("serializing config")?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating config directory {:?}", parent))?;
    }
    std::fs::write(path, yaml).with_context(|| format!("writing {:?}", path))?;

    log::info!("save_config: wrote {:?}", path);
    Ok(())
}
