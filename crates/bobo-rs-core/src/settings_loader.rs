//! Settings loading from configuration files.
//!
//! This module loads [`Settings`] from TOML or JSON files and applies
//! environment variable overrides.
//!
//! ## Loading Order
//!
//! 1. Start with default settings.
//! 2. Load from a TOML or JSON file (overriding defaults).
//! 3. Apply environment variable overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `BOBO_DEBUG` | `debug` |
//! | `BOBO_LOG_LEVEL` | `log_level` |
//! | `BOBO_HANDLE_EXCEPTIONS` | `handle_exceptions` |
//! | `BOBO_DEFAULT_CONTENT_TYPE` | `default_content_type` |
//! | `BOBO_STRICT_STATUS_CODES` | `strict_status_codes` |
//! | `BOBO_HOST` | `host` |
//! | `BOBO_PORT` | `port` |
//! | `BOBO_MAX_BODY_SIZE` | `max_body_size` |
//!
//! ## Examples
//!
//! ```rust,no_run
//! use bobo_rs_core::settings_loader;
//!
//! // Load from TOML
//! let settings = settings_loader::from_toml_file("config/app.toml").unwrap();
//!
//! // Pick the format from the file extension and apply environment overrides
//! let settings = settings_loader::from_file_with_env("config/app.json").unwrap();
//! ```

use std::path::Path;

use crate::error::BoboError;
use crate::settings::{parse_bool, Settings};

/// Loads settings from a TOML string.
///
/// Keys missing from the TOML keep their default values.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or cannot be deserialized.
pub fn from_toml_str(toml_str: &str) -> Result<Settings, BoboError> {
    // Merge over the serialized defaults so partial files are accepted.
    let toml_value: toml::Value = toml::from_str(toml_str)
        .map_err(|e| BoboError::ConfigurationError(format!("Failed to parse TOML: {e}")))?;

    let json_value = toml_to_json(toml_value);
    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        BoboError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, json_value);
    serde_json::from_value(merged).map_err(|e| {
        BoboError::ConfigurationError(format!("Failed to deserialize settings from TOML: {e}"))
    })
}

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the TOML is malformed.
pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Settings, BoboError> {
    from_toml_str(&read_config(path.as_ref(), "TOML")?)
}

/// Loads settings from a JSON string.
///
/// # Errors
///
/// Returns an error if the JSON is malformed or cannot be deserialized.
pub fn from_json_str(json_str: &str) -> Result<Settings, BoboError> {
    let json_value: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| BoboError::ConfigurationError(format!("Failed to parse JSON: {e}")))?;

    let default_json = serde_json::to_value(Settings::default()).map_err(|e| {
        BoboError::ConfigurationError(format!("Failed to serialize default settings: {e}"))
    })?;

    let merged = merge_json(default_json, json_value);
    serde_json::from_value(merged).map_err(|e| {
        BoboError::ConfigurationError(format!("Failed to deserialize settings from JSON: {e}"))
    })
}

/// Loads settings from a JSON file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or the JSON is malformed.
pub fn from_json_file(path: impl AsRef<Path>) -> Result<Settings, BoboError> {
    from_json_str(&read_config(path.as_ref(), "JSON")?)
}

/// Loads settings from a file, choosing the format from its extension.
///
/// `.json` files are read as JSON; anything else is read as TOML.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn from_file(path: impl AsRef<Path>) -> Result<Settings, BoboError> {
    let path = path.as_ref();
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        from_json_file(path)
    } else {
        from_toml_file(path)
    }
}

/// Loads settings from a file and then applies environment variable overrides.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, BoboError> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Loads settings from just environment variables (starting from defaults).
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `BOBO_*` environment variable overrides to a settings struct.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides(settings, |key| std::env::var(key).ok());
}

/// Applies `BOBO_*` overrides read through `lookup`.
///
/// Values that fail to parse (e.g. a non-numeric port) leave the setting unchanged.
pub fn apply_overrides(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(val) = lookup("BOBO_DEBUG") {
        settings.debug = parse_bool(&val);
    }

    if let Some(val) = lookup("BOBO_LOG_LEVEL") {
        settings.log_level = val;
    }

    if let Some(val) = lookup("BOBO_HANDLE_EXCEPTIONS") {
        settings.handle_exceptions = parse_bool(&val);
    }

    if let Some(val) = lookup("BOBO_DEFAULT_CONTENT_TYPE") {
        settings.default_content_type = val;
    }

    if let Some(val) = lookup("BOBO_STRICT_STATUS_CODES") {
        settings.strict_status_codes = parse_bool(&val);
    }

    if let Some(val) = lookup("BOBO_HOST") {
        settings.host = val;
    }

    if let Some(val) = lookup("BOBO_PORT") {
        if let Ok(port) = val.trim().parse::<u16>() {
            settings.port = port;
        }
    }

    if let Some(val) = lookup("BOBO_MAX_BODY_SIZE") {
        if let Ok(size) = val.trim().parse::<usize>() {
            settings.max_body_size = size;
        }
    }
}

// ============================================================
// Helpers
// ============================================================

fn read_config(path: &Path, format: &str) -> Result<String, BoboError> {
    std::fs::read_to_string(path).map_err(|e| {
        BoboError::ConfigurationError(format!(
            "Failed to read {format} file '{}': {e}",
            path.display()
        ))
    })
}

/// Converts a TOML value to a `serde_json::Value`.
fn toml_to_json(value: toml::Value) -> serde_json::Value {
    match value {
        toml::Value::String(s) => serde_json::Value::String(s),
        toml::Value::Integer(i) => serde_json::json!(i),
        toml::Value::Float(f) => serde_json::json!(f),
        toml::Value::Boolean(b) => serde_json::Value::Bool(b),
        toml::Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
        toml::Value::Array(arr) => {
            serde_json::Value::Array(arr.into_iter().map(toml_to_json).collect())
        }
        toml::Value::Table(table) => {
            let map: serde_json::Map<String, serde_json::Value> = table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}

/// Deep-merges two JSON values. The `override_val` takes precedence.
fn merge_json(base: serde_json::Value, override_val: serde_json::Value) -> serde_json::Value {
    match (base, override_val) {
        (serde_json::Value::Object(mut base_map), serde_json::Value::Object(override_map)) => {
            for (key, override_v) in override_map {
                let merged = if let Some(base_v) = base_map.remove(&key) {
                    merge_json(base_v, override_v)
                } else {
                    override_v
                };
                base_map.insert(key, merged);
            }
            serde_json::Value::Object(base_map)
        }
        (_, override_val) => override_val,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ── TOML loading ────────────────────────────────────────────────

    #[test]
    fn test_from_toml_str_basic() {
        let toml = r#"
            handle_exceptions = false
            log_level = "debug"
            port = 9090
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert!(!settings.handle_exceptions);
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.port, 9090);
        // Defaults preserved
        assert_eq!(settings.default_content_type, "text/html; charset=UTF-8");
    }

    #[test]
    fn test_from_toml_str_extra_table() {
        let toml = r#"
            [extra]
            wiki_root = "/srv/wiki"
            page_size = 20
        "#;

        let settings = from_toml_str(toml).unwrap();
        assert_eq!(settings.extra("wiki_root"), Some(&serde_json::json!("/srv/wiki")));
        assert_eq!(settings.extra("page_size"), Some(&serde_json::json!(20)));
    }

    #[test]
    fn test_from_toml_str_empty() {
        let settings = from_toml_str("").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_from_toml_str_invalid() {
        assert!(from_toml_str("[[invalid toml content").is_err());
    }

    #[test]
    fn test_from_toml_str_wrong_type() {
        let result = from_toml_str("port = \"eighty\"");
        assert!(matches!(result, Err(BoboError::ConfigurationError(_))));
    }

    // ── JSON loading ────────────────────────────────────────────────

    #[test]
    fn test_from_json_str_basic() {
        let json = r#"{
            "strict_status_codes": true,
            "default_content_type": "text/plain"
        }"#;

        let settings = from_json_str(json).unwrap();
        assert!(settings.strict_status_codes);
        assert_eq!(settings.default_content_type, "text/plain");
        assert!(settings.handle_exceptions);
    }

    #[test]
    fn test_from_json_str_invalid() {
        assert!(from_json_str("{invalid json").is_err());
    }

    // ── File loading ────────────────────────────────────────────────

    #[test]
    fn test_from_file_dispatches_on_extension() {
        let dir = tempfile::tempdir().unwrap();

        let toml_path = dir.path().join("app.toml");
        std::fs::write(&toml_path, "port = 7000").unwrap();
        assert_eq!(from_file(&toml_path).unwrap().port, 7000);

        let json_path = dir.path().join("app.json");
        std::fs::write(&json_path, r#"{"port": 7001}"#).unwrap();
        assert_eq!(from_file(&json_path).unwrap().port, 7001);
    }

    #[test]
    fn test_from_file_missing() {
        let result = from_file("/nonexistent/path/app.toml");
        assert!(matches!(result, Err(BoboError::ConfigurationError(_))));
    }

    // ── Overrides ───────────────────────────────────────────────────

    #[test]
    fn test_apply_overrides_booleans() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("BOBO_HANDLE_EXCEPTIONS", "false"),
                ("BOBO_DEBUG", "yes"),
                ("BOBO_STRICT_STATUS_CODES", "1"),
            ]),
        );
        assert!(!settings.handle_exceptions);
        assert!(settings.debug);
        assert!(settings.strict_status_codes);
    }

    #[test]
    fn test_apply_overrides_strings_and_numbers() {
        let mut settings = Settings::default();
        apply_overrides(
            &mut settings,
            lookup_from(&[
                ("BOBO_LOG_LEVEL", "warn"),
                ("BOBO_HOST", "0.0.0.0"),
                ("BOBO_PORT", "8000"),
                ("BOBO_MAX_BODY_SIZE", "1024"),
                ("BOBO_DEFAULT_CONTENT_TYPE", "text/plain"),
            ]),
        );
        assert_eq!(settings.log_level, "warn");
        assert_eq!(settings.bind_address(), "0.0.0.0:8000");
        assert_eq!(settings.max_body_size, 1024);
        assert_eq!(settings.default_content_type, "text/plain");
    }

    #[test]
    fn test_apply_overrides_invalid_port_is_ignored() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, lookup_from(&[("BOBO_PORT", "not-a-number")]));
        assert_eq!(settings.port, Settings::default().port);
    }

    #[test]
    fn test_apply_overrides_nothing_set() {
        let mut settings = Settings::default();
        apply_overrides(&mut settings, |_| None);
        assert_eq!(settings, Settings::default());
    }

    // ── merge_json helper ───────────────────────────────────────────

    #[test]
    fn test_merge_json_nested() {
        let base = serde_json::json!({"outer": {"a": 1, "b": 2}});
        let over = serde_json::json!({"outer": {"b": 3}});
        let merged = merge_json(base, over);
        assert_eq!(merged["outer"]["a"], 1);
        assert_eq!(merged["outer"]["b"], 3);
    }

    #[test]
    fn test_merge_json_array_override() {
        let base = serde_json::json!({"list": [1, 2, 3]});
        let over = serde_json::json!({"list": [4, 5]});
        let merged = merge_json(base, over);
        assert_eq!(merged["list"], serde_json::json!([4, 5]));
    }
}
