//! Config Validation Tests
//!
//! Unknown-key detection and range validation, exercised through the
//! public config API independently from the rest of the pipeline.

use accelmon::config::validation::{
    known_config_keys, suggest_correction, validate_ranges, validate_unknown_keys,
};
use accelmon::config::{ConfigError, MonitorConfig};
use accelmon::types::{StateEntry, StateTable};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_window_step_warns_with_suggestion() {
    let toml_str = r#"
[window]
setp = 20
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("setp"));
    assert_eq!(warnings[0].suggestion.as_deref(), Some("window.step"));
}

#[test]
fn typo_in_debounce_threshold_warns() {
    let toml_str = r#"
[debounce]
treshold = 3
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].suggestion.as_deref(), Some("debounce.threshold"));
    assert!(warnings[0].to_string().contains("did you mean"));
}

#[test]
fn unknown_section_without_close_match_has_no_suggestion() {
    let warnings = validate_unknown_keys("[dashboard]\nenabled = true\n");
    assert_eq!(warnings.len(), 2);
    assert!(warnings.iter().all(|w| w.suggestion.is_none()));
}

#[test]
fn valid_config_produces_zero_warnings() {
    let toml_str = r#"
[serial]
port = "/dev/ttyACM0"
baud_rate = 9600
read_timeout_ms = 500

[window]
size = 120
step = 40

[calibration]
samples = 200
default_bias = [-128.0, -80.0, 940.0]

[debounce]
threshold = 4

[model]
path = "models/svm.json"

[storage]
data_dir = "/var/lib/accelmon"

[[states]]
code = "ATPP"
label = "NORMAL"

[[states]]
code = "ATFA"
label = "FAULT 1"
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");

    let config = MonitorConfig::from_toml_str(toml_str).unwrap();
    assert_eq!(config.serial.baud_rate, 9600);
    assert_eq!(config.window.size, 120);
    assert_eq!(config.states.len(), 2);
    assert_eq!(config.states.entries()[1].label, "FAULT 1");
}

#[test]
fn unknown_keys_do_not_break_loading() {
    let config = MonitorConfig::from_toml_str("[window]\nsize = 100\nstpe = 10\n").unwrap();
    assert_eq!(config.window.step, 30);
}

#[test]
fn every_default_field_is_a_known_key() {
    let rendered = MonitorConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&rendered).is_empty());
}

#[test]
fn suggestion_respects_distance_limit() {
    let known = known_config_keys();
    assert_eq!(suggest_correction("serial.prot", &known).as_deref(), Some("serial.port"));
    assert!(suggest_correction("completely.unrelated", &known).is_none());
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn default_config_passes_validation() {
    assert!(validate_ranges(&MonitorConfig::default()).is_empty());
}

#[test]
fn step_larger_than_size_is_rejected() {
    let mut config = MonitorConfig::default();
    config.window.step = 150;
    let errors = validate_ranges(&config);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].contains("window.step"));
}

#[test]
fn zero_values_are_each_reported() {
    let mut config = MonitorConfig::default();
    config.window.size = 0;
    config.window.step = 0;
    config.calibration.samples = 0;
    config.debounce.threshold = 0;
    config.serial.baud_rate = 0;

    let errors = validate_ranges(&config);
    assert!(errors.iter().any(|e| e.contains("window.size")));
    assert!(errors.iter().any(|e| e.contains("window.step")));
    assert!(errors.iter().any(|e| e.contains("calibration.samples")));
    assert!(errors.iter().any(|e| e.contains("debounce.threshold")));
    assert!(errors.iter().any(|e| e.contains("serial.baud_rate")));
}

#[test]
fn command_codes_must_be_four_ascii_chars() {
    let mut config = MonitorConfig::default();
    config.states = StateTable::new(vec![
        StateEntry::new("ATPP", "NORMAL"),
        StateEntry::new("ATF", "FAULT 1"),
        StateEntry::new("ÄTFB", "FAULT 2"),
    ]);
    let errors = validate_ranges(&config);
    assert_eq!(errors.len(), 2);
    assert!(errors[0].contains("states[1]"));
    assert!(errors[1].contains("states[2]"));
}

#[test]
fn empty_state_table_is_rejected() {
    let mut config = MonitorConfig::default();
    config.states = StateTable::new(Vec::new());
    assert!(validate_ranges(&config).iter().any(|e| e.contains("states")));
}

#[test]
fn non_finite_default_bias_is_rejected() {
    let mut config = MonitorConfig::default();
    config.calibration.default_bias = [0.0, f64::NAN, 0.0];
    assert!(validate_ranges(&config).iter().any(|e| e.contains("default_bias")));
}

#[test]
fn invalid_file_fails_with_all_violations() {
    let err = MonitorConfig::from_toml_str("[window]\nsize = 10\nstep = 20\n[debounce]\nthreshold = 0\n")
        .unwrap_err();
    match err {
        ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn saved_config_loads_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("accelmon.toml");

    let mut config = MonitorConfig::default();
    config.serial.port = "COM4".to_string();
    config.debounce.threshold = 7;
    config.save_to_file(&path).unwrap();

    assert_eq!(MonitorConfig::load_from_file(&path).unwrap(), config);
}
