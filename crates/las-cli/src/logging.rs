//! Logging setup for the LAS CLI
//!
//! Logs go to stderr so that stdout only ever carries command output. The
//! level comes from the `-v` count unless `RUST_LOG` is set, and
//! `LAS_LOG_FORMAT` picks between compact, full and json output.

use crate::error::{Error, Result};
use is_terminal::IsTerminal;
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Session id attached to every invocation's logs
static SESSION_ID: OnceLock<String> = OnceLock::new();

/// Logging configuration
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Log level filter
    pub level: String,
    /// Output format: compact, full, json
    pub format: LogFormat,
    /// Emit anything at all
    pub console: bool,
    /// Include thread IDs
    pub thread_ids: bool,
    /// Include file and line numbers
    pub source_location: bool,
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact format for everyday use
    Compact,
    /// Full format with all details
    Full,
    /// JSON structured format
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: LogFormat::Compact,
            console: true,
            thread_ids: false,
            source_location: false,
        }
    }
}

impl LoggingConfig {
    /// Create logging config from verbosity level
    pub fn from_verbosity(verbosity: u8) -> Self {
        let mut config = Self::default();

        match verbosity {
            0 => {}
            1 => {
                config.level = "info".to_string();
            }
            2 => {
                config.level = "debug".to_string();
                config.source_location = true;
            }
            _ => {
                config.level = "trace".to_string();
                config.format = LogFormat::Full;
                config.source_location = true;
                config.thread_ids = true;
            }
        }

        config
    }

    /// Apply `RUST_LOG` and `LAS_LOG_FORMAT`
    pub fn merge_with_env(&mut self) {
        self.merge_with(|name| std::env::var(name).ok());
    }

    fn merge_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(rust_log) = lookup("RUST_LOG") {
            self.level = rust_log;
        }

        if let Some(format) = lookup("LAS_LOG_FORMAT") {
            match format.to_lowercase().as_str() {
                "compact" => self.format = LogFormat::Compact,
                "full" => self.format = LogFormat::Full,
                "json" => self.format = LogFormat::Json,
                _ => eprintln!("Invalid log format '{}', using default", format),
            }
        }
    }
}

/// Initialize the global logging system
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let level = if config.console { config.level.as_str() } else { "off" };
    let env_filter = EnvFilter::try_new(level)
        .map_err(|e| Error::other(format!("Invalid log filter '{}': {}", level, e)))?;
    let ansi = std::io::stderr().is_terminal();

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(config.thread_ids)
        .with_file(config.source_location)
        .with_line_number(config.source_location);

    // Each format has its own subscriber type
    let installed = match config.format {
        LogFormat::Compact => {
            tracing::subscriber::set_global_default(builder.with_ansi(ansi).compact().finish())
        }
        LogFormat::Full => tracing::subscriber::set_global_default(builder.with_ansi(ansi).finish()),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(builder.with_ansi(false).json().finish())
        }
    };
    installed.map_err(|e| Error::other(format!("Failed to initialize logging: {}", e)))?;

    let session_id = SESSION_ID.get_or_init(generate_session_id);
    tracing::debug!(session_id = %session_id, format = ?config.format, "Logging initialized");

    Ok(())
}

pub fn generate_session_id() -> String {
    format!("las_{}", Uuid::new_v4().simple())
}

/// The id generated by [`init_logging`], if logging is up
pub fn session_id() -> Option<&'static str> {
    SESSION_ID.get().map(|s| s.as_str())
}

/// Sensitive data redaction utilities
pub mod redaction {
    use regex::Regex;
    use serde_json::Value;
    use std::sync::OnceLock;

    static ASSIGNMENT_REGEX: OnceLock<Option<Regex>> = OnceLock::new();
    static SCHEME_REGEX: OnceLock<Option<Regex>> = OnceLock::new();

    const SENSITIVE_KEYS: &[&str] = &[
        "secret",
        "password",
        "apikey",
        "accesstoken",
        "refreshtoken",
        "authorization",
        "credential",
    ];

    fn assignment_regex() -> Option<&'static Regex> {
        ASSIGNMENT_REGEX
            .get_or_init(|| {
                Regex::new(
                    r#"(?i)(api[_-]?key|client[_-]?secret|access[_-]?token|password)["']?\s*[=:]\s*["']?([^\s"',}]+)"#,
                )
                .ok()
            })
            .as_ref()
    }

    fn scheme_regex() -> Option<&'static Regex> {
        SCHEME_REGEX
            .get_or_init(|| Regex::new(r"(?i)\b(bearer|basic)\s+[a-z0-9._~+/=-]+").ok())
            .as_ref()
    }

    /// Redact credentials from free text
    pub fn redact_sensitive(input: &str) -> String {
        let mut result = input.to_string();

        if let Some(regex) = assignment_regex() {
            result = regex.replace_all(&result, "$1=***").to_string();
        }
        if let Some(regex) = scheme_regex() {
            result = regex.replace_all(&result, "$1 ***").to_string();
        }

        result
    }

    /// Redact credentials from a JSON value in place
    pub fn redact_json_value(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    if is_sensitive_key(key) {
                        *val = Value::String("***".to_string());
                    } else {
                        redact_json_value(val);
                    }
                }
            }
            Value::Array(items) => items.iter_mut().for_each(redact_json_value),
            Value::String(s) => *s = redact_sensitive(s),
            _ => {}
        }
    }

    fn is_sensitive_key(key: &str) -> bool {
        let normalized: String = key
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        SENSITIVE_KEYS.iter().any(|k| normalized.contains(k))
    }
}

/// Performance timing utilities
pub mod timing {
    use std::time::{Duration, Instant};

    /// Logs how long an operation took when dropped
    pub struct Timer {
        start: Instant,
        operation: &'static str,
    }

    impl Timer {
        pub fn new(operation: &'static str) -> Self {
            Self {
                start: Instant::now(),
                operation,
            }
        }

        pub fn elapsed(&self) -> Duration {
            self.start.elapsed()
        }
    }

    impl Drop for Timer {
        fn drop(&mut self) {
            tracing::debug!(
                operation = self.operation,
                duration_ms = self.start.elapsed().as_millis() as u64,
                "Operation completed"
            );
        }
    }
}
