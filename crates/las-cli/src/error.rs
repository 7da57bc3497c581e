//! Error types and handling for the CLI
//!
//! Library errors are wrapped as-is so the exit code can reflect what went
//! wrong on the wire.

use std::io;
use std::path::PathBuf;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from las-core
    #[error(transparent)]
    Core(#[from] las_core::Error),

    /// File not found
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    /// Invalid argument combination
    #[error("Invalid arguments: {0}")]
    InvalidArgs(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create an invalid arguments error
    pub fn invalid_args(message: impl Into<String>) -> Self {
        Self::InvalidArgs(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Io(_) => 1,
            Self::Core(core) => core_exit_code(core),
            Self::FileNotFound { .. } => 12,
            Self::InvalidArgs(_) => 13,
            Self::Json(_) => 14,
            Self::Yaml(_) => 15,
            Self::Other { .. } => 99,
        }
    }

    /// Check if this error should display usage help
    pub fn should_show_help(&self) -> bool {
        matches!(self, Self::InvalidArgs(_))
    }
}

fn core_exit_code(error: &las_core::Error) -> i32 {
    use las_core::Error as Core;

    match error {
        Core::Io { .. } => 1,
        Core::Configuration { .. } => 2,
        Core::Auth { .. } => 3,
        Core::RateLimit { .. } => 4,
        Core::Request { .. } => 5,
        Core::Decode { .. } => 6,
        Core::Transport { .. } => 7,
        Core::Cancelled => 8,
        Core::Signing { .. } => 9,
        Core::Json { .. } => 10,
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}
