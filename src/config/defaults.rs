//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery. `MonitorConfig::default()` is
//! built from these values.

// ============================================================================
// Serial Link
// ============================================================================

/// Default serial device.
pub const SERIAL_PORT: &str = "/dev/ttyUSB0";

/// Default baud rate of the sensor board.
pub const SERIAL_BAUD_RATE: u32 = 115_200;

/// Per-line read timeout (ms). A timed-out read is skipped like a malformed line.
pub const SERIAL_READ_TIMEOUT_MS: u64 = 1_000;

/// Initial capacity of the inbound line buffer (bytes).
pub const LINE_BUFFER_CAPACITY: usize = 64;

// ============================================================================
// Windowing
// ============================================================================

/// Samples per analysed window.
pub const WINDOW_SIZE: usize = 100;

/// Samples evicted per truncation (overlap = size - step).
pub const WINDOW_STEP: usize = 30;

// ============================================================================
// Calibration
// ============================================================================

/// Valid readings averaged into the bias.
pub const CALIBRATION_SAMPLES: usize = 100;

/// Bias in effect until a calibration succeeds (raw sensor counts).
pub const DEFAULT_BIAS: [f64; 3] = [-130.0, -85.0, 935.0];

// ============================================================================
// Debounce
// ============================================================================

/// Consecutive identical classifications required before acting.
pub const DEBOUNCE_THRESHOLD: u32 = 5;

// ============================================================================
// Files
// ============================================================================

/// Config file searched in the working directory.
pub const CONFIG_FILE_NAME: &str = "accelmon.toml";

/// Environment variable pointing at a config file.
pub const CONFIG_ENV_VAR: &str = "ACCELMON_CONFIG";

/// Default classifier export.
pub const MODEL_PATH: &str = "model.json";

/// Directory for the bias state file.
pub const DATA_DIR: &str = "./data";

/// Bias state file name inside the data directory.
pub const BIAS_FILE_NAME: &str = "bias.json";

// ============================================================================
// Protocol
// ============================================================================

/// Length of every outbound command token.
pub const COMMAND_CODE_LEN: usize = 4;
