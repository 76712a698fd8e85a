use crate::error::{AppError, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "config.yaml";
pub const DEFAULT_API_URL: &str = "https://sm.ms/api/v2";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sm_token: String,
    #[serde(default = "default_shots")]
    pub shots: usize,
    #[serde(default = "default_quality")]
    pub quality: u32,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg: String,
    #[serde(default = "default_ffprobe")]
    pub ffprobe: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_shots() -> usize {
    3
}

fn default_quality() -> u32 {
    5
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_ffmpeg() -> String {
    "ffmpeg".to_string()
}

fn default_ffprobe() -> String {
    "ffprobe".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// `config.yaml` next to the running executable.
pub fn default_path() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE_NAME)))
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME))
}

impl Config {
    /// Load and validate the config file. A missing `sm_token` is an error, never defaulted.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(AppError::Config(format!(
                "no config file at {}",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::from_yaml(&content)?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| AppError::Config(format!("invalid config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command line overrides, re-validating the result.
    pub fn with_overrides(mut self, shots: Option<usize>, quality: Option<u32>) -> Result<Self> {
        if let Some(shots) = shots {
            self.shots = shots;
        }
        if let Some(quality) = quality {
            self.quality = quality;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    fn validate(&self) -> Result<()> {
        if self.sm_token.trim().is_empty() {
            return Err(AppError::Config("missing required key 'sm_token'".to_string()));
        }
        if self.shots == 0 {
            return Err(AppError::Config("shots must be at least 1".to_string()));
        }
        if !(2..=31).contains(&self.quality) {
            return Err(AppError::Config(format!(
                "quality must be between 2 and 31, got {}",
                self.quality
            )));
        }
        Ok(())
    }
}
