//! Unified error type hierarchy for the options window
//!
//! Provides structured error handling with ConfigError, BackendError,
//! FetchError, ImportError and AppError.

use std::io;
use thiserror::Error;

/// Configuration file parsing and persistence errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Invalid JSON in config: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),

    #[error("IO error during config operations: {0}")]
    IoError(#[from] io::Error),
}

/// Failures of the message channel between the page and the background service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    #[error("Backend channel is full, request dropped: {0}")]
    ChannelFull(String),

    #[error("Backend service is not running")]
    Disconnected,
}

/// Errors raised while downloading or parsing a custom filter list.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to download filter list: {0}")]
    Http(String),

    #[error("Filter list responded with status {0}")]
    Status(u16),

    #[error("Filter list contains no rules")]
    EmptyList,

    #[error("Unsupported filter URL: {0}")]
    UnsupportedUrl(String),

    #[error("IO error while reading filter list: {0}")]
    Io(#[from] io::Error),
}

/// Errors raised by the settings import flow.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Could not read settings file: {0}")]
    Read(#[from] io::Error),

    #[error("Settings file is empty")]
    Empty,

    #[error("Could not send settings to the backend: {0}")]
    Backend(#[from] BackendError),
}

/// Global error type for UI-facing operations
///
/// Provides unified error categorization and user-facing messages.
#[derive(Error, Debug, Clone)]
pub enum AppError {
    /// OS command failed (e.g., xdg-open)
    #[error("Command '{cmd}' failed: {reason}")]
    OsCommand { cmd: String, reason: String },

    /// File I/O error (read/write/delete)
    #[error("I/O error: {0}")]
    Io(String),

    /// Settings persist or deserialize error
    #[error("Settings error: {0}")]
    Settings(String),

    /// Backend channel error
    #[error("Backend error: {0}")]
    Backend(String),

    /// Invalid input (e.g., malformed domain or URL)
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AppError {
    /// Get a user-facing error message suitable for UI display
    pub fn user_message(&self) -> String {
        match self {
            AppError::OsCommand { cmd, reason } => {
                format!("Failed to execute '{}': {}", cmd, reason)
            }
            AppError::Io(msg) => format!("File operation failed: {}", msg),
            AppError::Settings(msg) => format!("Settings error: {}", msg),
            AppError::Backend(msg) => format!("The filtering service did not respond: {}", msg),
            AppError::InvalidInput(msg) => format!("Invalid input: {}", msg),
        }
    }
}

impl From<io::Error> for AppError {
    fn from(e: io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}

impl From<BackendError> for AppError {
    fn from(e: BackendError) -> Self {
        AppError::Backend(e.to_string())
    }
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Settings(e.to_string())
    }
}

impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Io(s)
    }
}

/// Top-level result type for operations that may fail.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::FileNotFound("/etc/settings.json".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration file not found: /etc/settings.json"
        );
    }

    #[test]
    fn test_backend_error_into_app_error() {
        let err: AppError = BackendError::Disconnected.into();
        assert!(err.user_message().contains("not running"));
    }

    #[test]
    fn test_import_error_wraps_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: ImportError = io_err.into();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_result_type_err() {
        let result: Result<i32> = Err("test error".into());
        assert!(result.is_err());
    }
}
