//! Error types module
//!
//! This module provides the error taxonomy shared by every PTMD crate. Domain
//! failures (permission, state, ordering, lookup, configuration) and ambient
//! failures (database, drive, extraction) are unified under [`AppError`] so the
//! API layer only has to map one enum onto responses.
//!
//! The `Database` variant and `From<sqlx::Error>` are gated behind the `sqlx` feature.

use std::io;

#[cfg(feature = "sqlx")]
use sqlx::Error as SqlxError;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like guard failures
    Debug,
    /// Warning level - for rejected input
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata for error responses - defines how an error should be presented
/// by the HTTP layer that consumes the core.
pub trait ErrorMetadata {
    /// HTTP status code to return
    fn http_status_code(&self) -> u16;

    /// Machine-readable error code (e.g., "PERMISSION_DENIED")
    fn error_code(&self) -> &'static str;

    /// Whether this error is recoverable (can be retried)
    fn is_recoverable(&self) -> bool;

    /// Client-facing message (may differ from internal error message)
    fn client_message(&self) -> String;

    /// Whether details should be hidden in production
    fn is_sensitive(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[cfg(feature = "sqlx")]
    #[error("Database error: {0}")]
    Database(#[source] SqlxError),

    #[cfg(not(feature = "sqlx"))]
    #[error("Database error: {0}")]
    Database(String),

    #[error("Drive error: {0}")]
    Storage(String),

    /// A lifecycle guard rejected the caller (wrong user or role).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// The transition is not allowed from the entity's current state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A date breaks the start/end/ship/receive ordering.
    #[error("Ordering violation: {0}")]
    OrderingViolation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Static configuration (sheet schema, environment) is inconsistent.
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown {kind} code: {key}")]
    UnknownCode { kind: &'static str, key: String },

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Internal error with source")]
    InternalWithSource {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(feature = "sqlx")]
impl From<SqlxError> for AppError {
    fn from(err: SqlxError) -> Self {
        AppError::Database(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::InternalWithSource {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<io::Error> for AppError {
    fn from(err: io::Error) -> Self {
        AppError::Internal(format!("IO error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::InvalidInput(format!("JSON parsing error: {}", err))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::InvalidInput(format!("Validation error: {}", err))
    }
}

/// Static metadata for each variant: (http_status, error_code, recoverable, sensitive, log_level).
fn app_error_static_metadata(err: &AppError) -> (u16, &'static str, bool, bool, LogLevel) {
    match err {
        AppError::Database(_) => (500, "DATABASE_ERROR", true, true, LogLevel::Error),
        AppError::Storage(_) => (502, "DRIVE_ERROR", true, true, LogLevel::Error),
        AppError::PermissionDenied(_) => (403, "PERMISSION_DENIED", false, false, LogLevel::Debug),
        AppError::InvalidState(_) => (409, "INVALID_STATE", false, false, LogLevel::Debug),
        AppError::OrderingViolation(_) => (400, "ORDERING_VIOLATION", false, false, LogLevel::Debug),
        AppError::NotFound(_) => (404, "NOT_FOUND", false, false, LogLevel::Debug),
        AppError::Configuration(_) => (500, "CONFIGURATION_ERROR", false, true, LogLevel::Error),
        AppError::UnknownCode { .. } => (400, "UNKNOWN_CODE", false, false, LogLevel::Debug),
        AppError::Extraction(_) => (400, "EXTRACTION_ERROR", false, false, LogLevel::Warn),
        AppError::InvalidInput(_) => (400, "INVALID_INPUT", false, false, LogLevel::Debug),
        AppError::Internal(_) | AppError::InternalWithSource { .. } => {
            (500, "INTERNAL_ERROR", true, true, LogLevel::Error)
        }
    }
}

impl AppError {
    /// Get the error type name for detailed error responses
    pub fn error_type(&self) -> &str {
        match self {
            AppError::Database(_) => "Database",
            AppError::Storage(_) => "Storage",
            AppError::PermissionDenied(_) => "PermissionDenied",
            AppError::InvalidState(_) => "InvalidState",
            AppError::OrderingViolation(_) => "OrderingViolation",
            AppError::NotFound(_) => "NotFound",
            AppError::Configuration(_) => "Configuration",
            AppError::UnknownCode { .. } => "UnknownCode",
            AppError::Extraction(_) => "Extraction",
            AppError::InvalidInput(_) => "InvalidInput",
            AppError::Internal(_) => "Internal",
            AppError::InternalWithSource { .. } => "Internal",
        }
    }

    /// Get detailed error information including error chain
    pub fn detailed_message(&self) -> String {
        use std::error::Error;

        let mut details = self.to_string();

        let mut source = self.source();
        let mut depth = 0;
        while let Some(err) = source {
            depth += 1;
            if depth > 5 {
                details.push_str("\n  ... (truncated)");
                break;
            }
            details.push_str(&format!("\n  Caused by: {}", err));
            source = err.source();
        }

        details
    }
}

impl ErrorMetadata for AppError {
    fn http_status_code(&self) -> u16 {
        app_error_static_metadata(self).0
    }

    fn error_code(&self) -> &'static str {
        app_error_static_metadata(self).1
    }

    fn is_recoverable(&self) -> bool {
        app_error_static_metadata(self).2
    }

    fn is_sensitive(&self) -> bool {
        app_error_static_metadata(self).3
    }

    fn log_level(&self) -> LogLevel {
        app_error_static_metadata(self).4
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Database(_) => "Failed to access database".to_string(),
            AppError::Storage(_) => "Failed to access the drive".to_string(),
            AppError::Configuration(_) => "Server misconfiguration".to_string(),
            AppError::Internal(_) | AppError::InternalWithSource { .. } => {
                "Internal server error".to_string()
            }
            AppError::PermissionDenied(ref msg)
            | AppError::InvalidState(ref msg)
            | AppError::OrderingViolation(ref msg)
            | AppError::NotFound(ref msg)
            | AppError::Extraction(ref msg)
            | AppError::InvalidInput(ref msg) => msg.clone(),
            AppError::UnknownCode { kind, key } => format!("Unknown {} code: {}", kind, key),
        }
    }
}
