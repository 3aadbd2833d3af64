use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::system::platform;

/// Faster polling makes delta-based CPU readings degenerate toward 0 or noise.
pub const MIN_REFRESH_RATE_MS: u64 = 1000;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub cleanup: CleanupConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub refresh_rate_ms: u64,
    pub volume: Option<PathBuf>,
    pub elevate: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            refresh_rate_ms: MIN_REFRESH_RATE_MS,
            volume: None,
            elevate: false,
        }
    }
}

impl GeneralConfig {
    pub fn refresh_rate_ms(&self) -> u64 {
        self.refresh_rate_ms.max(MIN_REFRESH_RATE_MS)
    }

    pub fn volume(&self) -> PathBuf {
        self.volume.clone().unwrap_or_else(platform::system_volume)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    pub scratch_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Text,
            file: None,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("memsweep").join("config.toml"))
}

pub fn load_config() -> Config {
    match config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Config::default(),
    }
}

pub fn load_config_from_path(path: &Path) -> Config {
    match std::fs::read_to_string(path) {
        Ok(contents) => toml::from_str(&contents).unwrap_or_default(),
        Err(_) => Config::default(),
    }
}
