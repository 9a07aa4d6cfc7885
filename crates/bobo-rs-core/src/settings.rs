//! Settings for bobo-rs applications.
//!
//! This module provides the [`Settings`] struct, which holds the configuration
//! recognised by an application and by the bundled server adapter. Settings are
//! owned by the application that uses them; there is no process-wide instance.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The content type used for handler results that do not specify one.
pub const DEFAULT_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use bobo_rs_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.handle_exceptions);
/// assert_eq!(settings.default_content_type, "text/html; charset=UTF-8");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled. Controls the log format.
    pub debug: bool,

    // ── Request handling ─────────────────────────────────────────────

    /// Whether errors raised by handlers are turned into 500 responses.
    ///
    /// When `false`, handler errors are returned to the caller of the
    /// application unmodified.
    pub handle_exceptions: bool,
    /// The content type for handler results that are plain text or bytes.
    pub default_content_type: String,
    /// Report resolution failures with 405/403/415 instead of 404.
    pub strict_status_codes: bool,

    // ── Server ───────────────────────────────────────────────────────

    /// Host the bundled server binds to.
    pub host: String,
    /// Port the bundled server binds to.
    pub port: u16,
    /// Largest request body, in bytes, the bundled server accepts.
    pub max_body_size: usize,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "warn").
    pub log_level: String,

    // ── Escape hatch ─────────────────────────────────────────────────

    /// Custom settings for application code.
    pub extra: HashMap<String, serde_json::Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            handle_exceptions: true,
            default_content_type: DEFAULT_CONTENT_TYPE.to_string(),
            strict_status_codes: false,
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_body_size: 2 * 1024 * 1024,
            log_level: "info".to_string(),
            extra: HashMap::new(),
        }
    }
}

impl Settings {
    /// Returns the `host:port` address the bundled server binds to.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Looks up a value in [`extra`](Settings::extra).
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }
}

/// Parses a boolean configuration string.
///
/// `"true"`, `"1"` and `"yes"` (any case) are true; everything else is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "true" | "1" | "yes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let s = Settings::default();
        assert!(!s.debug);
        assert!(s.handle_exceptions);
        assert!(!s.strict_status_codes);
        assert_eq!(s.default_content_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(s.log_level, "info");
        assert_eq!(s.port, 8080);
        assert!(s.extra.is_empty());
    }

    #[test]
    fn test_bind_address() {
        let s = Settings {
            host: "0.0.0.0".to_string(),
            port: 9000,
            ..Settings::default()
        };
        assert_eq!(s.bind_address(), "0.0.0.0:9000");
    }

    #[test]
    fn test_extra_lookup() {
        let mut s = Settings::default();
        s.extra.insert("wiki_root".to_string(), serde_json::json!("/srv/wiki"));
        assert_eq!(s.extra("wiki_root"), Some(&serde_json::json!("/srv/wiki")));
        assert!(s.extra("missing").is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool("TRUE"));
        assert!(parse_bool(" yes "));
        assert!(parse_bool("1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("nope"));
    }
}
