//! Failure output of the CLI.
//!
//! Library errors reach `main` wrapped in `anyhow`. When the root is an
//! [`AppError`], its [`ErrorMetadata`] decides the code, the message shown,
//! whether internal details are printed and the exit status.

use std::process::ExitCode;

use ptmd_core::{AppError, ErrorMetadata, LogLevel};
use serde::Serialize;

/// Exit status for rejected requests (4xx-class errors).
const EXIT_REJECTED: u8 = 2;
/// Exit status for everything else.
const EXIT_FAILED: u8 = 1;

#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub error: String,
    pub code: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub recoverable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip)]
    status: u16,
    #[serde(skip)]
    level: LogLevel,
}

impl ErrorReport {
    pub fn from_anyhow(err: &anyhow::Error, production: bool) -> Self {
        match err.downcast_ref::<AppError>() {
            Some(app) => Self::from_app_error(app, production),
            None => Self {
                error: format!("{:#}", err),
                code: "CLI_ERROR",
                kind: None,
                recoverable: false,
                details: None,
                status: 500,
                level: LogLevel::Error,
            },
        }
    }

    /// The internal error chain is only attached outside production, and
    /// never for sensitive errors.
    pub fn from_app_error(err: &AppError, production: bool) -> Self {
        let details = (!production && !err.is_sensitive()).then(|| err.detailed_message());
        Self {
            error: err.client_message(),
            code: err.error_code(),
            kind: Some(err.error_type().to_string()),
            recoverable: err.is_recoverable(),
            details,
            status: err.http_status_code(),
            level: err.log_level(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        if (400..500).contains(&self.status) {
            EXIT_REJECTED
        } else {
            EXIT_FAILED
        }
    }

    pub fn log(&self) {
        match self.level {
            LogLevel::Debug => tracing::debug!(code = self.code, "{}", self.error),
            LogLevel::Warn => tracing::warn!(code = self.code, "{}", self.error),
            LogLevel::Error => tracing::error!(code = self.code, "{}", self.error),
        }
    }

    /// Log the failure, print it as JSON on stderr and turn it into the exit status.
    pub fn emit(&self) -> ExitCode {
        self.log();
        match serde_json::to_string_pretty(self) {
            Ok(out) => eprintln!("{}", out),
            Err(_) => eprintln!("{}: {}", self.code, self.error),
        }
        ExitCode::from(self.exit_code())
    }
}
