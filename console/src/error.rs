//! Error types for the desk console
//!
//! All errors use thiserror for structured error handling.
//! Remote failures carry the HTTP status (when one was received) so callers
//! can tell a server rejection from a transport problem.

use crate::models::Domain;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Remote failure{}: {}", fmt_status(.status), .message)]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Configuration unavailable: {0}")]
    ConfigUnavailable(String),

    #[error("Section closed: {0}")]
    SectionClosed(Domain),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("{0}")]
    Generic(String),
}

impl AppError {
    /// Build a remote failure from a status code and response body
    pub fn remote(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Remote {
            status,
            message: message.into(),
        }
    }

    /// HTTP status of a remote failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::Remote { status, .. } => *status,
            _ => None,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::Remote {
            status: e.status().map(|s| s.as_u16()),
            message: e.to_string(),
        }
    }
}

fn fmt_status(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, AppError>;
