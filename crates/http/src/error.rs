//! Error handling for the Libris HTTP layer
//!
//! Every failure is rendered as `{"error": "<message>"}` with the status code of its
//! class. The generated error id is logged and echoed in the `x-error-id` header so a
//! report from the browser can be matched against server logs.

use axum::{
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

pub const ERROR_ID_HEADER: &str = "x-error-id";

/// Standard error response format for all HTTP errors
#[derive(Debug, Serialize)]
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

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Validation { .. } => "validation_error",
            AppError::NotFound { .. } => "not_found",
            AppError::BadRequest { .. } => "bad_request",
            AppError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let error_id = Uuid::new_v4();
        let status = self.status();
        let code = self.code();

        let message = match self {
            AppError::Validation { message }
            | AppError::NotFound { message }
            | AppError::BadRequest { message } => {
                tracing::warn!(
                    error_id = %error_id,
                    error_code = code,
                    status_code = status.as_u16(),
                    %message,
                    "request rejected"
                );
                message
            }
            AppError::Internal(e) => {
                tracing::error!(
                    error_id = %error_id,
                    error_code = code,
                    status_code = status.as_u16(),
                    error = ?e,
                    "request failed"
                );
                // Internal details stay in the logs for release builds.
                if cfg!(debug_assertions) {
                    format!("{:#}", e)
                } else {
                    "An internal server error occurred".to_string()
                }
            }
        };

        let mut response = (status, Json(ErrorBody { error: message })).into_response();
        if let Ok(value) = HeaderValue::from_str(&error_id.to_string()) {
            response.headers_mut().insert(ERROR_ID_HEADER, value);
        }
        response
    }
}
