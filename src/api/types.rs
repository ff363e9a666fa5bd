//! Local API request and response types

use crate::analytics::StockSelection;
use crate::error::{AppError, ErrorResponse};
use crate::requests::Operation;
use crate::selection::WorkflowStage;
use crate::strategy::ParamMap;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Uniform response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    /// Page path the UI should move to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success_with_message(message: &str) -> Self {
        Self {
            status: "success".to_string(),
            message: Some(message.to_string()),
            data: None,
            code: None,
            redirect: None,
        }
    }

    pub fn success_with_data(data: T) -> Self {
        Self {
            status: "success".to_string(),
            message: None,
            data: Some(data),
            code: None,
            redirect: None,
        }
    }

    pub fn with_redirect(mut self, path: &str) -> Self {
        self.redirect = Some(path.to_string());
        self
    }
}

impl ApiResponse<Empty> {
    pub fn error(err: &AppError) -> Self {
        let ErrorResponse { code, message, redirect } = ErrorResponse::from(err);
        Self {
            status: "error".to_string(),
            message: Some(message),
            data: None,
            code: Some(code),
            redirect,
        }
    }
}

/// Placeholder payload for responses without data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Empty {}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Precondition { .. } => StatusCode::PRECONDITION_FAILED,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Backend { .. } | AppError::Http(_) => StatusCode::BAD_GATEWAY,
            AppError::Superseded(_) => StatusCode::CONFLICT,
            AppError::Database(_)
            | AppError::Serialization(_)
            | AppError::Config(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!("API request failed: {}", self);
        }
        (status, Json(ApiResponse::<Empty>::error(&self))).into_response()
    }
}

/// `GET /api/stocks/search`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub query: String,
}

/// `POST /api/optimize/apply`
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyParamsRequest {
    pub params: ParamMap,
}

/// Session overview returned by `GET /api/state`
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub stage: WorkflowStage,
    pub selected_stock: Option<StockSelection>,
    pub has_result: bool,
    pub optimized_params: Option<ParamMap>,
    /// Operations with backend requests outstanding
    pub loading: Vec<Operation>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}
