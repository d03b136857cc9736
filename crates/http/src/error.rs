//! Error handling for the HTTP layer

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::{NoContext, Timestamp, Uuid};

/// Body of every error response: `{"error": "..."}`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Create a validation error (HTTP 400)
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error (HTTP 404)
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::validation(format!("invalid JSON body: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v7(Timestamp::now(NoContext));
        let status = self.status();
        let error_code = self.code();

        let message = match self {
            AppError::Validation { message } | AppError::NotFound { message } => {
                tracing::warn!(
                    error_id = %error_id,
                    error_code,
                    status_code = status.as_u16(),
                    %message,
                    "request rejected"
                );
                message
            }
            AppError::Internal(e) => {
                tracing::error!(
                    error_id = %error_id,
                    error_code,
                    status_code = status.as_u16(),
                    error = ?e,
                    "request failed"
                );
                // Raw storage errors stay in the logs for release builds.
                if cfg!(debug_assertions) {
                    e.to_string()
                } else {
                    "An internal server error occurred".to_string()
                }
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
