//! Calibration result persisted between CLI runs

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::types::Bias;

#[derive(Error, Debug)]
pub enum StateFileError {
    #[error("State file I/O error ({}): {}", .0.display(), .1)]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Malformed state file ({}): {}", .0.display(), .1)]
    Format(PathBuf, #[source] serde_json::Error),
}

/// Contents of `bias.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiasRecord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    /// Readings averaged to produce the bias
    pub samples: usize,
    pub calibrated_at: DateTime<Utc>,
}

impl BiasRecord {
    pub fn new(bias: Bias, samples: usize) -> Self {
        Self {
            x: bias.x,
            y: bias.y,
            z: bias.z,
            samples,
            calibrated_at: Utc::now(),
        }
    }

    pub const fn bias(&self) -> Bias {
        Bias::new(self.x, self.y, self.z)
    }
}

/// Which bias a session is running with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BiasOrigin {
    Calibrated,
    Default,
}

/// Write atomically (temp file, then rename).
pub fn save_bias(path: &Path, record: &BiasRecord) -> Result<(), StateFileError> {
    let json = serde_json::to_vec_pretty(record)
        .map_err(|e| StateFileError::Format(path.to_path_buf(), e))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| StateFileError::Io(parent.to_path_buf(), e))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, &json).map_err(|e| StateFileError::Io(tmp_path.clone(), e))?;
    std::fs::rename(&tmp_path, path).map_err(|e| StateFileError::Io(path.to_path_buf(), e))?;
    Ok(())
}

pub fn load_bias(path: &Path) -> Result<BiasRecord, StateFileError> {
    let data = std::fs::read(path).map_err(|e| StateFileError::Io(path.to_path_buf(), e))?;
    serde_json::from_slice(&data).map_err(|e| StateFileError::Format(path.to_path_buf(), e))
}

/// Stored bias if readable and finite, otherwise `fallback`.
pub fn load_bias_or(path: &Path, fallback: Bias) -> (Bias, BiasOrigin) {
    match load_bias(path) {
        Ok(record) if record.bias().is_finite() => {
            info!(
                bias = %record.bias(),
                calibrated_at = %record.calibrated_at.to_rfc3339(),
                "Using stored calibration"
            );
            (record.bias(), BiasOrigin::Calibrated)
        }
        Ok(_) => {
            warn!(path = %path.display(), "Stored bias is not finite, using default");
            (fallback, BiasOrigin::Default)
        }
        Err(StateFileError::Io(_, e)) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(bias = %fallback, "No stored calibration, using default bias");
            (fallback, BiasOrigin::Default)
        }
        Err(e) => {
            warn!("{}, using default bias", e);
            (fallback, BiasOrigin::Default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("bias.json");
        let record = BiasRecord::new(Bias::new(-128.5, -84.0, 936.25), 100);

        save_bias(&path, &record).unwrap();
        let loaded = load_bias(&path).unwrap();
        assert_eq!(loaded, record);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_timestamp_is_rfc3339() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bias.json");
        save_bias(&path, &BiasRecord::new(Bias::ZERO, 1)).unwrap();

        let raw: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        let stamp = raw["calibrated_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(stamp).is_ok());
    }

    #[test]
    fn test_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let fallback = Bias::new(-130.0, -85.0, 935.0);
        let (bias, origin) = load_bias_or(&dir.path().join("bias.json"), fallback);
        assert_eq!(bias, fallback);
        assert_eq!(origin, BiasOrigin::Default);
    }

    #[test]
    fn test_corrupt_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bias.json");
        std::fs::write(&path, "{\"x\": 1").unwrap();

        assert!(matches!(load_bias(&path), Err(StateFileError::Format(..))));
        let (bias, origin) = load_bias_or(&path, Bias::ZERO);
        assert_eq!(bias, Bias::ZERO);
        assert_eq!(origin, BiasOrigin::Default);
    }

    #[test]
    fn test_stored_bias_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bias.json");
        save_bias(&path, &BiasRecord::new(Bias::new(1.0, 2.0, 3.0), 10)).unwrap();

        let (bias, origin) = load_bias_or(&path, Bias::ZERO);
        assert_eq!(bias, Bias::new(1.0, 2.0, 3.0));
        assert_eq!(origin, BiasOrigin::Calibrated);
    }
}
