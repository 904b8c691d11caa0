//! Application error types.

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

use orderdesk_core::auth::AuthError;
use orderdesk_core::store::StoreError;

use crate::models::ErrorResponse;

/// Convenience alias for handler return types.
pub type AppResult<T> = Result<T, AppError>;

/// Application-level errors with HTTP status mapping.
///
/// `Unauthorized` carries only a generic public message; the actual cause
/// (missing header, bad signature, expired token, unknown user) is logged
/// server-side and never surfaced to the caller.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation failed")]
    Validation(HashMap<String, String>),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(&'static str),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: "validation_failed".to_string(),
                    message: "Invalid input data".to_string(),
                    validation_errors: Some(fields),
                },
            ),
            AppError::NotFound(m) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: "not_found".to_string(),
                    message: m,
                    validation_errors: None,
                },
            ),
            AppError::Conflict(m) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: "conflict".to_string(),
                    message: m,
                    validation_errors: None,
                },
            ),
            AppError::Unauthorized(m) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "unauthorized".to_string(),
                    message: m.to_string(),
                    validation_errors: None,
                },
            ),
            AppError::Internal(m) => {
                error!(detail = %m, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "internal_error".to_string(),
                        message: "Internal server error".to_string(),
                        validation_errors: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<AuthError> for AppError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials => AppError::Unauthorized("Invalid credentials"),
            AuthError::TokenNotFound | AuthError::TokenExpired => {
                // Cause stays in the logs; the caller sees one generic body.
                warn!(cause = %e, "refresh token rejected");
                AppError::Unauthorized("Invalid refresh token")
            }
            AuthError::TokenError(msg) => {
                warn!(cause = %msg, "token processing failed");
                AppError::Unauthorized("Authentication required")
            }
            AuthError::Store(e) => AppError::from(e),
            AuthError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::OrderNotFound(_) | StoreError::ItemNotFound(_) => {
                AppError::NotFound(e.to_string())
            }
            StoreError::DuplicateOrderNumber(_) => AppError::Conflict(e.to_string()),
            StoreError::Db(e) => AppError::Internal(e.to_string()),
            StoreError::Internal(msg) => AppError::Internal(msg),
        }
    }
}
