//! Monitor Configuration - every tunable of the acquisition and analysis modes
//!
//! Each section implements `Default` with the values in `config::defaults`,
//! so a missing file or a partial file behaves exactly like the built-in setup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;
use crate::types::{Bias, StateTable};

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one sensor deployment.
///
/// Load with `MonitorConfig::load()` which searches:
/// 1. `$ACCELMON_CONFIG` env var
/// 2. `./accelmon.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Serial link settings
    #[serde(default)]
    pub serial: SerialConfig,

    /// Sliding window geometry
    #[serde(default)]
    pub window: WindowConfig,

    /// Calibration parameters and fallback bias
    #[serde(default)]
    pub calibration: CalibrationConfig,

    /// State confirmation
    #[serde(default)]
    pub debounce: DebounceConfig,

    /// Classifier export location
    #[serde(default)]
    pub model: ModelConfig,

    /// Local state files
    #[serde(default)]
    pub storage: StorageConfig,

    /// Command code and operator label per class label (index = label)
    #[serde(default)]
    pub states: StateTable,
}

impl MonitorConfig {
    /// Load configuration using the standard search order:
    /// 1. `$ACCELMON_CONFIG` environment variable
    /// 2. `./accelmon.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Some(path) = Self::env_path() {
            if path.exists() {
                match Self::load_from_file(&path) {
                    Ok(config) => {
                        info!(path = %path.display(), "Loaded monitor config from {}", defaults::CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "Failed to load config from {}, falling back", defaults::CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path.display(), "{} points to non-existent file, falling back", defaults::CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(defaults::CONFIG_FILE_NAME);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded monitor config from ./{}", defaults::CONFIG_FILE_NAME);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", defaults::CONFIG_FILE_NAME);
                }
            }
        }

        info!("No {} found, using built-in defaults", defaults::CONFIG_FILE_NAME);
        Self::default()
    }

    /// Path a `configure` run should write to: the env var target if set,
    /// otherwise `./accelmon.toml`.
    pub fn preferred_path() -> PathBuf {
        Self::env_path().unwrap_or_else(|| PathBuf::from(defaults::CONFIG_FILE_NAME))
    }

    fn env_path() -> Option<PathBuf> {
        std::env::var(defaults::CONFIG_ENV_VAR)
            .ok()
            .filter(|p| !p.is_empty())
            .map(PathBuf::from)
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    ///
    /// Unknown keys are reported as warnings only; range violations fail.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Write the config to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let contents = self.to_toml()?;
        std::fs::write(path, contents).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        info!(path = %path.display(), "Monitor config saved");
        Ok(())
    }

    /// Validate all settings for internal consistency.
    ///
    /// Collects every violation before failing so the operator sees them all.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let errors = super::validation::validate_ranges(self);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Serial port settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Device path or COM name
    pub port: String,
    pub baud_rate: u32,
    /// Per-line read timeout in milliseconds
    pub read_timeout_ms: u64,
}

impl SerialConfig {
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: defaults::SERIAL_PORT.to_string(),
            baud_rate: defaults::SERIAL_BAUD_RATE,
            read_timeout_ms: defaults::SERIAL_READ_TIMEOUT_MS,
        }
    }
}

/// Sliding window geometry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Samples per analysed window
    pub size: usize,
    /// Samples evicted per truncation
    pub step: usize,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            size: defaults::WINDOW_SIZE,
            step: defaults::WINDOW_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Valid readings averaged into the bias
    pub samples: usize,
    /// Bias used until a calibration succeeds
    pub default_bias: [f64; 3],
}

impl CalibrationConfig {
    pub fn default_bias(&self) -> Bias {
        Bias::from(self.default_bias)
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            samples: defaults::CALIBRATION_SAMPLES,
            default_bias: defaults::DEFAULT_BIAS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Consecutive identical classifications before the command is sent
    pub threshold: u32,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::DEBOUNCE_THRESHOLD,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(defaults::MODEL_PATH),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn bias_path(&self) -> PathBuf {
        self.data_dir.join(defaults::BIAS_FILE_NAME)
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(defaults::DATA_DIR),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config parse error ({}): {}", .0.display(), .1)]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(#[source] toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_constants() {
        let config = MonitorConfig::default();
        assert_eq!(config.serial.port, "/dev/ttyUSB0");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.window.size, 100);
        assert_eq!(config.window.step, 30);
        assert_eq!(config.calibration.samples, 100);
        assert_eq!(config.calibration.default_bias(), Bias::new(-130.0, -85.0, 935.0));
        assert_eq!(config.debounce.threshold, 5);
        assert_eq!(config.states.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = MonitorConfig::from_toml_str(
            r#"
[window]
step = 10
"#,
        )
        .unwrap();
        assert_eq!(config.window.size, 100);
        assert_eq!(config.window.step, 10);
        assert_eq!(config.serial.baud_rate, 115_200);
    }

    #[test]
    fn test_states_table_from_array_of_tables() {
        let config = MonitorConfig::from_toml_str(
            r#"
[[states]]
code = "OKOK"
label = "IDLE"

[[states]]
code = "STOP"
label = "JAM"
"#,
        )
        .unwrap();
        assert_eq!(config.states.len(), 2);
        assert_eq!(config.states.entries()[1].code, "STOP");
    }

    #[test]
    fn test_toml_roundtrip_via_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accelmon.toml");

        let mut config = MonitorConfig::default();
        config.serial.port = "/dev/ttyACM3".to_string();
        config.serial.baud_rate = 57_600;
        config.save_to_file(&path).unwrap();

        let loaded = MonitorConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_invalid_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        std::fs::write(&path, "[window\nsize = ").unwrap();

        let err = MonitorConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(ref p, _) if p == &path));
    }
}
