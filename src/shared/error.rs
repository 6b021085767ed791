use thiserror::Error;
use serde::Serialize;

use super::events::NotificationLevel;

#[derive(Error, Debug, Clone, PartialEq, Serialize)]
pub enum AppError {
    #[error("Service error: {0}")]
    ServiceStatus(u16),

    #[error("Service not available")]
    ServiceUnavailable,

    #[error("Network Error: {0}")]
    Network(String),

    #[error("Clipboard Error: {0}")]
    Clipboard(String),

    #[error("Please click in a text input area first")]
    NoEditableTarget,

    #[error("Validation Error: {0}")]
    Validation(String),

    #[error("Unknown action: {0}")]
    UnknownAction(String),

    #[error("Context Error: {0}")]
    Context(String),

    /// Error message received from another context, passed through verbatim
    #[error("{0}")]
    Remote(String),

    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Unknown Error: {0}")]
    Unknown(String),
}

impl AppError {
    /// Severity used when the error is surfaced as a notification
    pub fn level(&self) -> NotificationLevel {
        match self {
            AppError::NoEditableTarget | AppError::Validation(_) => NotificationLevel::Warning,
            _ => NotificationLevel::Error,
        }
    }
}

// Implement conversion from standard errors
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Validation(format!("Serialization error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
