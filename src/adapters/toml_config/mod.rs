// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::EngineConfig;
use crate::error::{ShrinkXError, ShrinkXResult};
use crate::utils::logging::LoggingConfig;

/// Everything the compressor can be configured with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorConfig {
    /// Encoder executable
    pub ffmpeg_path: PathBuf,
    /// Value reported to progress sinks at 100%
    pub progress_max: f64,
    pub logging: LoggingConfig,
}

impl Default for CompressorConfig {
    fn default() -> Self {
        let engine = EngineConfig::default();
        Self {
            ffmpeg_path: engine.ffmpeg_path,
            progress_max: engine.progress_max,
            logging: LoggingConfig::default(),
        }
    }
}

impl CompressorConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            ffmpeg_path: self.ffmpeg_path.clone(),
            progress_max: self.progress_max,
        }
    }

    pub fn validate(&self) -> ShrinkXResult<()> {
        if self.ffmpeg_path.as_os_str().is_empty() {
            return Err(ShrinkXError::ConfigError {
                message: "ffmpeg_path cannot be empty".to_string(),
            });
        }
        if !(self.progress_max.is_finite() && self.progress_max > 0.0) {
            return Err(ShrinkXError::ConfigError {
                message: format!("progress_max must be positive, got {}", self.progress_max),
            });
        }
        Ok(())
    }
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Deserialize config from TOML string
    pub fn parse(content: &str) -> ShrinkXResult<CompressorConfig> {
        toml::from_str(content).map_err(|e| ShrinkXError::ConfigError {
            message: format!("Failed to parse TOML config: {}", e),
        })
    }

    /// Serialize config to TOML string
    pub fn render(config: &CompressorConfig) -> ShrinkXResult<String> {
        toml::to_string_pretty(config).map_err(|e| ShrinkXError::ConfigError {
            message: format!("Failed to serialize config: {}", e),
        })
    }

    pub fn load(path: &Path) -> ShrinkXResult<CompressorConfig> {
        let content = std::fs::read_to_string(path).map_err(|e| ShrinkXError::ConfigError {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;
        let config = Self::parse(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(config: &CompressorConfig, path: &Path) -> ShrinkXResult<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, Self::render(config)?)?;
        info!("Saved configuration to {}", path.display());
        Ok(())
    }
}
