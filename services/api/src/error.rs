//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::StoreError;
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or rejected input with a human-readable message
    #[error("{0}")]
    Validation(String),

    /// An id-based lookup missed
    #[error("{0}")]
    NotFound(String),

    /// Missing, malformed or expired session token
    #[error("Not authorized to access this resource")]
    Unauthorized,

    /// Login with an unknown email or wrong password
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Valid identity but insufficient role or ownership
    #[error("{0}")]
    Forbidden(String),

    /// Password hashing primitive failure
    #[error("Password hashing failed")]
    Hashing,

    /// Document serialization failure at the store boundary
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Document store failure
    #[error(transparent)]
    Store(#[from] StoreError),

    /// External collaborator failure with a caller-facing message
    #[error("{0}")]
    Upstream(String),

    /// Any other request-fatal failure
    #[error("Server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            ApiError::Validation(message) => (StatusCode::BAD_REQUEST, message.clone()),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message.clone()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, self.to_string()),
            ApiError::Forbidden(message) => (StatusCode::FORBIDDEN, message.clone()),
            // Duplicate unique fields are a client error, everything else
            // from the store is a server-side failure.
            ApiError::Store(StoreError::Duplicate { .. }) => {
                (StatusCode::BAD_REQUEST, "Duplicate field is not allowed".to_string())
            }
            ApiError::Upstream(message) => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
            ApiError::Hashing
            | ApiError::Serialization(_)
            | ApiError::Store(_)
            | ApiError::Internal => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
            }
        };

        let body = Json(json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
