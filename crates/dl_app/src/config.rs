use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dl_engine::aria2::Aria2Settings;
use dl_engine::DownloaderSettings;
use dl_logging::dl_info;
use serde::{Deserialize, Serialize};

/// Read when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "dl.ron";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DlConfig {
    pub downloader: DownloaderSettings,
    pub aria2: Aria2Settings,
}

/// Loads `path`, or `./dl.ron` when `path` is `None`. Only the implicit
/// default file may be missing; its absence yields the defaults.
pub fn load(path: Option<&Path>) -> Result<DlConfig> {
    let (path, required) = match path {
        Some(path) => (path.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound && !required => {
            return Ok(DlConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read config {}", path.display()))
        }
    };

    let config = ron::from_str(&content)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    dl_info!("Loaded config from {:?}", path);
    Ok(config)
}
