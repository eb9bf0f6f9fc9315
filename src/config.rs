//! Configuration system with TOML persistence.
//!
//! Supports loading from file and sensible defaults.

use crate::error::{ConfigError, Result};
use crate::synth::SynthesisParams;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Image loading configuration
    pub loader: LoaderConfig,

    /// Audio synthesis configuration
    pub synthesis: SynthesisConfig,

    /// Metrics configuration
    pub metrics: MetricsConfig,
}

/// Pixel loader configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Images whose width or height exceed this are downsampled
    pub max_dimension: u32,
}

/// Audio synthesis configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SynthesisConfig {
    /// Output sample rate in Hz (8000-192000)
    pub sample_rate: u32,

    /// Rendered duration in whole seconds
    pub duration_secs: u32,

    /// Final gain applied to both channels (0.0-1.0]
    pub headroom: f32,
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable metrics collection
    pub enabled: bool,

    /// Histogram precision (significant value digits)
    pub histogram_precision: u8,

    /// Maximum histogram value in milliseconds
    pub histogram_max_ms: u64,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_dimension: 2048,
        }
    }
}

impl Default for SynthesisConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44_100,
            duration_secs: 30,
            headroom: 0.4,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            histogram_precision: 2,
            histogram_max_ms: 60_000,
        }
    }
}

impl SynthesisConfig {
    pub fn params(&self) -> SynthesisParams {
        SynthesisParams {
            sample_rate: self.sample_rate,
            duration_secs: self.duration_secs,
            headroom: self.headroom,
        }
    }
}

impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::LoadFailed {
            path: Box::new(path.to_path_buf()),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::InvalidFormat {
            path: Box::new(path.to_path_buf()),
            source,
        })
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load_from_file(path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::SaveFailed {
                path: Box::new(path.to_path_buf()),
                source,
            })?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|source| ConfigError::SerializationFailed { source })?;

        std::fs::write(path, contents).map_err(|source| ConfigError::SaveFailed {
            path: Box::new(path.to_path_buf()),
            source,
        })
    }

    /// Get default config file path
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("astro-sonify");

        config_dir.join("config.toml")
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loader.max_dimension == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "Maximum image dimension must be > 0".to_string(),
            });
        }

        if let Err(e) = self.synthesis.params().validate() {
            return Err(ConfigError::ValidationFailed {
                reason: e.to_string(),
            });
        }

        if !(1..=5).contains(&self.metrics.histogram_precision) {
            return Err(ConfigError::ValidationFailed {
                reason: format!(
                    "Histogram precision {} out of range 1-5",
                    self.metrics.histogram_precision
                ),
            });
        }

        if self.metrics.histogram_max_ms < 2 {
            return Err(ConfigError::ValidationFailed {
                reason: "Histogram max must be >= 2ms".to_string(),
            });
        }

        Ok(())
    }
}

mod dirs {
    use std::path::PathBuf;

    pub fn config_dir() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_CONFIG_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".config"))
                })
        }

        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }

        #[cfg(target_os = "windows")]
        {
            std::env::var("APPDATA").ok().map(PathBuf::from)
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_valid() {
        let config = AppConfig::default();
        config.validate().expect("Default config should be valid");
    }

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).expect("Should serialize");
        let deserialized: AppConfig = toml::from_str(&toml_str).expect("Should deserialize");
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: AppConfig = toml::from_str("[synthesis]\nduration_secs = 45\n").unwrap();
        assert_eq!(config.synthesis.duration_secs, 45);
        assert_eq!(config.synthesis.sample_rate, 44_100);
        assert_eq!(config.loader.max_dimension, 2048);
    }

    #[test]
    fn test_validation_sample_rate() {
        let mut config = AppConfig::default();
        config.synthesis.sample_rate = 4000; // Too low
        assert!(config.validate().is_err());

        config.synthesis.sample_rate = 400_000; // Too high
        assert!(config.validate().is_err());

        config.synthesis.sample_rate = 48_000;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_duration_and_headroom() {
        let mut config = AppConfig::default();
        config.synthesis.duration_secs = 0;
        assert!(config.validate().is_err());

        config.synthesis.duration_secs = 45;
        config.synthesis.headroom = 0.0;
        assert!(config.validate().is_err());

        config.synthesis.headroom = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_max_dimension() {
        let mut config = AppConfig::default();
        config.loader.max_dimension = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = AppConfig::default();
        config.synthesis.duration_secs = 40;
        config.save_to_file(&path).unwrap();

        let loaded = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded.synthesis.duration_secs, 40);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(dir.path().join("missing.toml"));
        assert_eq!(config, AppConfig::default());
    }
}
