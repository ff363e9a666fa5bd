//! Application error types

use crate::selection::Page;
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend error ({status}): {message}")]
    Backend { status: u16, message: String },

    /// Required workflow state is missing; the UI should go to `redirect`
    #[error("{message}")]
    Precondition { message: String, redirect: Page },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Superseded request: {0}")]
    Superseded(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Serialization(_) => "SERIALIZATION_ERROR",
            AppError::Http(_) => "HTTP_ERROR",
            AppError::Backend { .. } => "BACKEND_ERROR",
            AppError::Precondition { .. } => "PRECONDITION_FAILED",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Superseded(_) => "SUPERSEDED",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Io(_) => "IO_ERROR",
        }
    }

    /// Page the UI should move to, for precondition failures
    pub fn redirect(&self) -> Option<Page> {
        match self {
            AppError::Precondition { redirect, .. } => Some(*redirect),
            _ => None,
        }
    }
}

/// Serializable error response for the UI
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl From<&AppError> for ErrorResponse {
    fn from(err: &AppError) -> Self {
        ErrorResponse {
            code: err.code().to_string(),
            message: err.to_string(),
            redirect: err.redirect().map(|p| p.path().to_string()),
        }
    }
}

impl From<AppError> for ErrorResponse {
    fn from(err: AppError) -> Self {
        ErrorResponse::from(&err)
    }
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::ser::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_response_carries_redirect() {
        let err = AppError::Precondition {
            message: "Please select a stock first".to_string(),
            redirect: Page::StockSelect,
        };
        let response = ErrorResponse::from(&err);

        assert_eq!(response.code, "PRECONDITION_FAILED");
        assert_eq!(response.message, "Please select a stock first");
        assert_eq!(response.redirect.as_deref(), Some("/stock"));
    }

    #[test]
    fn test_backend_error_serializes_without_redirect() {
        let err = AppError::Backend {
            status: 500,
            message: "boom".to_string(),
        };
        let json = serde_json::to_value(&err).unwrap();

        assert_eq!(json["code"], "BACKEND_ERROR");
        assert_eq!(json["message"], "Backend error (500): boom");
        assert!(json.get("redirect").is_none());
    }
}
