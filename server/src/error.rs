//! API Error Types
//!
//! One taxonomy for every handler. Variants map onto HTTP status codes; the
//! client-facing envelope (`statusCode`, `timestamp`, `path`, `message`) is
//! assembled by [`crate::api::error_envelope`], which reads the [`ErrorReport`]
//! extension attached here.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Message returned to clients for any internal failure.
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// Errors surfaced by API handlers and services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or missing input, invalid id, invalid pagination.
    #[error("{0}")]
    BadRequest(String),

    /// Missing or invalid credentials or session token.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed (insufficient permissions, inactive account).
    #[error("{0}")]
    Forbidden(String),

    /// Entity absent or soft-deleted.
    #[error("{0}")]
    NotFound(String),

    /// Duplicate unique key.
    #[error("{0}")]
    Conflict(String),

    /// Anything unexpected, tagged with the operation that failed.
    #[error("Method or Function: {operation}\n\nError: {message}")]
    Internal {
        operation: &'static str,
        message: String,
    },
}

/// Result type for API operations.
pub type ApiResult<T> = Result<T, ApiError>;

/// Client-safe error details handed to the envelope middleware.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub message: String,
}

/// Diagnostic details for an internal failure, never sent to the client.
#[derive(Debug, Clone)]
pub struct InternalFailure {
    pub operation: &'static str,
    pub message: String,
}

impl ApiError {
    /// Wrap an unexpected failure with the name of the operation.
    pub fn internal(operation: &'static str, err: impl std::fmt::Display) -> Self {
        Self::Internal {
            operation,
            message: err.to_string(),
        }
    }

    /// Build a `sqlx::Error` mapper for `map_err`.
    ///
    /// Unique violations become [`ApiError::Conflict`]; everything else is
    /// wrapped as [`ApiError::Internal`] under `operation`.
    pub fn database(operation: &'static str) -> impl FnOnce(sqlx::Error) -> Self {
        move |err| {
            if let sqlx::Error::Database(db_err) = &err {
                if db_err.is_unique_violation() {
                    let target = db_err.constraint().unwrap_or("unique key");
                    return Self::Conflict(format!("Duplicate value violates {target}"));
                }
            }
            Self::internal(operation, err)
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal { .. } => INTERNAL_MESSAGE.to_string(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.public_message();

        let failure = if let Self::Internal { operation, message } = &self {
            tracing::error!(operation, error = %message, "Unhandled internal error");
            Some(InternalFailure {
                operation,
                message: message.clone(),
            })
        } else {
            None
        };

        let mut response = (
            status,
            Json(json!({
                "statusCode": status.as_u16(),
                "message": message,
            })),
        )
            .into_response();

        response
            .extensions_mut()
            .insert(ErrorReport { message });
        if let Some(failure) = failure {
            response.extensions_mut().insert(failure);
        }
        response
    }
}

impl From<crate::permissions::PermissionError> for ApiError {
    fn from(err: crate::permissions::PermissionError) -> Self {
        Self::Forbidden(err.to_string())
    }
}
