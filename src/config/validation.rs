//! Config validation: unknown-key detection with Levenshtein suggestions
//! and range checks.
//!
//! Two-pass parse approach: first deserialize raw TOML into `toml::Value`,
//! walk the key tree, compare against known field names, and emit warnings
//! with "did you mean?" suggestions. Then proceed with normal serde
//! deserialization and `validate_ranges`. Unknown keys never break a config.

use std::collections::HashSet;

use super::defaults::COMMAND_CODE_LEN;
use super::MonitorConfig;

/// A non-fatal config warning (typo, suspicious value).
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Known Config Keys
// ============================================================================

/// Returns the complete set of valid dotted key paths for MonitorConfig.
///
/// Must be kept in step with the structs in `monitor_config.rs`.
/// `states` is an array of tables and is not descended into.
pub fn known_config_keys() -> HashSet<&'static str> {
    let keys: &[&str] = &[
        // [serial]
        "serial",
        "serial.port",
        "serial.baud_rate",
        "serial.read_timeout_ms",
        // [window]
        "window",
        "window.size",
        "window.step",
        // [calibration]
        "calibration",
        "calibration.samples",
        "calibration.default_bias",
        // [debounce]
        "debounce",
        "debounce.threshold",
        // [model]
        "model",
        "model.path",
        // [storage]
        "storage",
        "storage.data_dir",
        // [[states]]
        "states",
    ];
    keys.iter().copied().collect()
}

// ============================================================================
// TOML Key Walking
// ============================================================================

/// Recursively walks a `toml::Value` tree and collects all dotted key paths.
///
/// For example, a table `{ a = { b = 1, c = 2 } }` yields:
/// `["a", "a.b", "a.c"]`
pub fn walk_toml_keys(value: &toml::Value, prefix: &str) -> Vec<String> {
    let mut keys = Vec::new();
    if let Some(table) = value.as_table() {
        for (k, v) in table {
            let path = if prefix.is_empty() {
                k.clone()
            } else {
                format!("{prefix}.{k}")
            };
            keys.push(path.clone());
            if v.is_table() {
                keys.extend(walk_toml_keys(v, &path));
            }
        }
    }
    keys
}

// ============================================================================
// Levenshtein Distance
// ============================================================================

/// Compute the Levenshtein edit distance between two strings.
fn levenshtein(a: &str, b: &str) -> usize {
    let b_len = b.chars().count();
    if a.is_empty() {
        return b_len;
    }
    if b_len == 0 {
        return a.chars().count();
    }

    let mut prev: Vec<usize> = (0..=b_len).collect();
    let mut curr = vec![0; b_len + 1];

    for (i, ca) in a.chars().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.chars().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b_len]
}

/// Suggest the closest known key for an unknown key, if within edit distance 3.
pub fn suggest_correction(unknown: &str, known: &HashSet<&str>) -> Option<String> {
    let mut best: Option<(&str, usize)> = None;
    for &k in known {
        let dist = levenshtein(unknown, k);
        if dist > 3 {
            continue;
        }
        // Ties break alphabetically so suggestions are deterministic
        let better = match best {
            None => true,
            Some((best_key, best_dist)) => dist < best_dist || (dist == best_dist && k < best_key),
        };
        if better {
            best = Some((k, dist));
        }
    }
    best.map(|(k, _)| k.to_string())
}

// ============================================================================
// Unknown Key Validation (entry point)
// ============================================================================

/// Parse a raw TOML string and return warnings for any unknown config keys.
///
/// This does NOT fail on unknown keys; it only warns.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ValidationWarning> {
    let value: toml::Value = match raw_toml.parse() {
        Ok(v) => v,
        Err(_) => return Vec::new(), // parse errors are handled by serde later
    };

    let known = known_config_keys();
    walk_toml_keys(&value, "")
        .into_iter()
        .filter(|key| !known.contains(key.as_str()))
        .map(|key| {
            let suggestion = suggest_correction(&key, &known);
            let message = format!("Unknown config key '{key}'");
            ValidationWarning {
                field: key,
                message,
                suggestion,
            }
        })
        .collect()
}

// ============================================================================
// Range Validation
// ============================================================================

/// Check every setting that would make a mode misbehave.
///
/// Returns the list of violations; empty means valid.
pub fn validate_ranges(config: &MonitorConfig) -> Vec<String> {
    let mut errors = Vec::new();

    let w = &config.window;
    if w.size == 0 {
        errors.push("window.size must be > 0".to_string());
    }
    if w.step == 0 {
        errors.push("window.step must be > 0 (windows would never advance)".to_string());
    }
    if w.step > w.size {
        errors.push(format!(
            "window.step ({}) must not exceed window.size ({})",
            w.step, w.size
        ));
    }

    if config.debounce.threshold == 0 {
        errors.push("debounce.threshold must be >= 1".to_string());
    }

    if config.calibration.samples == 0 {
        errors.push("calibration.samples must be >= 1 (used as divisor)".to_string());
    }
    if !config.calibration.default_bias().is_finite() {
        errors.push("calibration.default_bias must contain finite values".to_string());
    }

    if config.serial.baud_rate == 0 {
        errors.push("serial.baud_rate must be > 0".to_string());
    }
    if config.serial.port.trim().is_empty() {
        errors.push("serial.port must not be empty".to_string());
    }

    if config.states.is_empty() {
        errors.push("states must define at least one entry".to_string());
    }
    for (i, entry) in config.states.entries().iter().enumerate() {
        if entry.code.len() != COMMAND_CODE_LEN || !entry.code.is_ascii() {
            errors.push(format!(
                "states[{i}].code = {:?} must be exactly {COMMAND_CODE_LEN} ASCII characters",
                entry.code
            ));
        }
    }

    errors
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_identical() {
        assert_eq!(levenshtein("window", "window"), 0);
    }

    #[test]
    fn test_levenshtein_one_edit() {
        assert_eq!(levenshtein("treshold", "threshold"), 1);
    }

    #[test]
    fn test_levenshtein_empty() {
        assert_eq!(levenshtein("", "abc"), 3);
        assert_eq!(levenshtein("abc", ""), 3);
    }

    #[test]
    fn test_walk_toml_keys_nested() {
        let toml: toml::Value = r#"
            [serial]
            port = "/dev/ttyUSB1"
        "#
        .parse()
        .unwrap();
        let keys = walk_toml_keys(&toml, "");
        assert!(keys.contains(&"serial".to_string()));
        assert!(keys.contains(&"serial.port".to_string()));
    }

    #[test]
    fn test_states_entries_are_not_flagged() {
        let warnings = validate_unknown_keys(
            r#"
[[states]]
code = "ATPP"
label = "NORMAL"
"#,
        );
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_step_larger_than_size_rejected() {
        let mut config = MonitorConfig::default();
        config.window.size = 10;
        config.window.step = 11;
        let errors = validate_ranges(&config);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("window.step"));
    }

    #[test]
    fn test_bad_command_code_rejected() {
        let mut config = MonitorConfig::default();
        config.states = crate::types::StateTable::new(vec![crate::types::StateEntry::new(
            "ATP", "NORMAL",
        )]);
        let errors = validate_ranges(&config);
        assert!(errors.iter().any(|e| e.contains("states[0].code")));
    }
}
