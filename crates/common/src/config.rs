//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{StabiloError, StabiloResult};

/// Global application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Default stabilization settings.
    pub stabilization: StabilizationDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Deployment defaults for a stabilization run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizationDefaults {
    /// Requested smoothing radius in frames. Signed so that a negative
    /// value can be clamped with a warning instead of rejected.
    pub smoothing_radius: i64,

    /// Size of the worker pool used for per-pair estimation and warping.
    /// `None` uses the global rayon pool.
    pub worker_threads: Option<usize>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "stabilo=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for StabilizationDefaults {
    fn default() -> Self {
        Self {
            smoothing_radius: 5,
            worker_threads: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load config from the standard location, falling back to defaults.
    pub fn load() -> Self {
        let config_path = config_file_path();
        if config_path.exists() {
            match Self::load_from(&config_path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %config_path.display(), error = %e, "Failed to load config, using defaults");
                }
            }
        }
        Self::default()
    }

    /// Load config from an explicit path.
    pub fn load_from(path: &Path) -> StabiloResult<Self> {
        if !path.exists() {
            return Err(StabiloError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the standard location.
    pub fn save(&self) -> StabiloResult<PathBuf> {
        let config_path = config_file_path();
        self.save_to(&config_path)?;
        Ok(config_path)
    }

    /// Save config to an explicit path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> StabiloResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Reject settings that cannot be recovered by clamping.
    pub fn validate(&self) -> StabiloResult<()> {
        if self.stabilization.worker_threads == Some(0) {
            return Err(StabiloError::config("worker_threads must be > 0"));
        }
        Ok(())
    }
}

/// Standard config file location.
pub fn config_file_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("stabilo").join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.stabilization.smoothing_radius, 5);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"stabilization": {"smoothing_radius": -2}}"#).unwrap();
        assert_eq!(config.stabilization.smoothing_radius, -2);
        assert_eq!(config.stabilization.worker_threads, None);
        assert_eq!(config.logging, LoggingConfig::default());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = AppConfig::default();
        config.stabilization.worker_threads = Some(0);
        assert!(matches!(
            config.validate(),
            Err(StabiloError::Config { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("stabilo-no-such-dir/config.json");
        assert!(matches!(
            AppConfig::load_from(&path),
            Err(StabiloError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = std::env::temp_dir().join(format!("stabilo-config-{}", std::process::id()));
        let path = dir.join("config.json");
        let mut config = AppConfig::default();
        config.stabilization.smoothing_radius = 12;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        std::fs::remove_dir_all(dir).ok();
    }
}
