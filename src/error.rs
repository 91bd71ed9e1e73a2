// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Every failure leaves the API as `{"error": CODE, "details": ...}` with a
//! stable machine-readable code. Storage and internal failures are logged
//! here and reach the client only as a generic 500.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing, malformed or expired access token.
    #[error("Authentication required")]
    Unauthorized,

    /// Unknown email or wrong password; the two are never distinguished.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Refresh token absent, expired, revoked or owned by someone else.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Same collapse as `InvalidToken`, reported as a bad request by the
    /// explicit revoke endpoint.
    #[error("Token cannot be revoked")]
    TokenNotRevocable,

    /// Refresh token is valid but its owner no longer exists.
    #[error("User not found")]
    UserNotFound,

    #[error("Email address already registered")]
    EmailTaken,

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Stable code sent to clients.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::InvalidToken | AppError::TokenNotRevocable => "INVALID_TOKEN",
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::EmailTaken => "EMAIL_TAKEN",
            AppError::ValidationFailed(_) => "VALIDATION_FAILED",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized
            | AppError::InvalidCredentials
            | AppError::InvalidToken
            | AppError::UserNotFound => StatusCode::UNAUTHORIZED,
            AppError::TokenNotRevocable
            | AppError::ValidationFailed(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmailTaken => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field_errors = errors.field_errors();
        let mut fields: Vec<&str> = field_errors.keys().map(|k| k.as_ref()).collect();
        fields.sort_unstable();
        AppError::ValidationFailed(fields.join(", "))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let details = match &self {
            AppError::ValidationFailed(msg) | AppError::NotFound(msg) | AppError::BadRequest(msg) => {
                Some(msg.clone())
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                None
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                None
            }
            _ => None,
        };

        let body = ErrorResponse {
            error: self.code().to_string(),
            details,
        };

        (self.status(), Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
