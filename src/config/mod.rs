//! Monitor Configuration Module
//!
//! Serial link, windowing, calibration, debounce and state-table settings
//! loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `ACCELMON_CONFIG` environment variable (path to TOML file)
//! 2. `accelmon.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Usage
//!
//! Call `config::init()` once at startup, then `config::get()` anywhere:
//!
//! ```ignore
//! config::init(MonitorConfig::load());
//! let step = config::get().window.step;
//! ```
//!
//! Pipeline components take their settings as constructor arguments; only
//! the binary entry points read the global.

mod monitor_config;
pub mod defaults;
pub mod validation;

pub use monitor_config::*;

use std::sync::OnceLock;

/// Global monitor configuration, initialized once at startup.
static MONITOR_CONFIG: OnceLock<MonitorConfig> = OnceLock::new();

/// Initialize the global monitor configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: MonitorConfig) {
    if MONITOR_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get a reference to the global monitor configuration.
///
/// Panics if `init()` has not been called. A missing config is a start-up
/// bug, not a recoverable condition.
#[allow(clippy::expect_used)]
pub fn get() -> &'static MonitorConfig {
    MONITOR_CONFIG
        .get()
        .expect("config::get() called before config::init(), this is a startup bug")
}
