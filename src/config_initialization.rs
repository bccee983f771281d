//! Configuration initialization and hierarchy management

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::adapters::{CompressorConfig, TomlConfigAdapter};
use crate::cli::Cli;
use crate::error::ShrinkXResult;
use crate::utils::logging::{LogFormat, LogLevel};

/// Files searched, in order, when no config file is named explicitly
pub const CONFIG_SEARCH_PATHS: [&str; 3] = [
    "config/production.toml",
    "config/development.toml",
    "shrinkx.toml",
];

/// Values that take precedence over the config file.
///
/// Environment variables reach this struct through clap's `env` fallbacks,
/// so an explicit flag beats its variable and both beat the file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub ffmpeg_path: Option<PathBuf>,
    pub progress_max: Option<f64>,
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
}

impl ConfigOverrides {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            config_file: cli.config.clone(),
            ffmpeg_path: cli.ffmpeg_path.clone(),
            progress_max: cli.progress_max,
            log_level: cli.log_level,
            log_format: cli.log_format,
        }
    }

    pub fn apply(&self, config: &mut CompressorConfig) {
        if let Some(path) = &self.ffmpeg_path {
            debug!("Override: ffmpeg_path = {}", path.display());
            config.ffmpeg_path = path.clone();
        }
        if let Some(max) = self.progress_max {
            debug!("Override: progress_max = {}", max);
            config.progress_max = max;
        }
        if let Some(level) = self.log_level {
            config.logging.level = level;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
    }
}

/// Find the config file to load, relative to `base` for the search paths
pub fn locate_config_file(base: &Path, explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    CONFIG_SEARCH_PATHS
        .iter()
        .map(|candidate| base.join(candidate))
        .find(|candidate| candidate.is_file())
}

/// Resolve the configuration with precedence: defaults < file < env < CLI.
///
/// Returns the config and the file it was read from, if any.
pub fn resolve_configuration(
    overrides: &ConfigOverrides,
) -> ShrinkXResult<(CompressorConfig, Option<PathBuf>)> {
    let base = std::env::current_dir()?;
    resolve_configuration_in(&base, overrides)
}

pub fn resolve_configuration_in(
    base: &Path,
    overrides: &ConfigOverrides,
) -> ShrinkXResult<(CompressorConfig, Option<PathBuf>)> {
    let source = locate_config_file(base, overrides.config_file.as_deref());
    let mut config = match &source {
        Some(path) => TomlConfigAdapter::load(path)?,
        None => CompressorConfig::default(),
    };

    overrides.apply(&mut config);
    config.validate()?;
    Ok((config, source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ShrinkXError;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_without_file() {
        let dir = TempDir::new().unwrap();
        let (config, source) = resolve_configuration_in(dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config, CompressorConfig::default());
        assert!(source.is_none());
    }

    #[test]
    fn test_search_order() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir(dir.path().join("config")).unwrap();
        std::fs::write(dir.path().join("shrinkx.toml"), "progress_max = 1.0").unwrap();
        std::fs::write(
            dir.path().join("config/development.toml"),
            "progress_max = 2.0",
        )
        .unwrap();

        let (config, source) = resolve_configuration_in(dir.path(), &ConfigOverrides::default()).unwrap();
        assert_eq!(config.progress_max, 2.0);
        assert_eq!(source, Some(dir.path().join("config/development.toml")));
    }

    #[test]
    fn test_overrides_beat_file() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("custom.toml");
        std::fs::write(
            &file,
            "ffmpeg_path = \"/usr/bin/ffmpeg\"\nprogress_max = 1000.0\n[logging]\nlevel = \"warn\"\n",
        )
        .unwrap();

        let overrides = ConfigOverrides {
            config_file: Some(file.clone()),
            progress_max: Some(1_000_000.0),
            log_level: Some(LogLevel::Trace),
            ..Default::default()
        };
        let (config, source) = resolve_configuration_in(dir.path(), &overrides).unwrap();
        assert_eq!(source, Some(file));
        assert_eq!(config.ffmpeg_path, PathBuf::from("/usr/bin/ffmpeg"));
        assert_eq!(config.progress_max, 1_000_000.0);
        assert_eq!(config.logging.level, LogLevel::Trace);
    }

    #[test]
    fn test_missing_explicit_file_is_error() {
        let dir = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            config_file: Some(dir.path().join("absent.toml")),
            ..Default::default()
        };
        let err = resolve_configuration_in(dir.path(), &overrides).unwrap_err();
        assert!(matches!(err, ShrinkXError::ConfigError { .. }));
    }

    #[test]
    fn test_invalid_override_fails_validation() {
        let dir = TempDir::new().unwrap();
        let overrides = ConfigOverrides {
            progress_max: Some(-5.0),
            ..Default::default()
        };
        assert!(resolve_configuration_in(dir.path(), &overrides).is_err());
    }
}
