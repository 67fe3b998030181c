//! Custom error types for the API service

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use campus_common::Role;
use serde_json::json;
use thiserror::Error;

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// No valid caller identity
    #[error("Unauthorized")]
    Unauthenticated,

    /// Valid identity, insufficient role
    #[error("Forbidden: {message}")]
    Forbidden {
        message: String,
        current_role: Option<Role>,
    },

    /// A role or record lookup failed; never retried
    #[error("Lookup failed: {0}")]
    LookupFailure(String),

    /// Bad request with message
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Missing record
    #[error("Not found: {0}")]
    NotFound(String),

    /// Error response relayed from an upstream provider
    #[error("Upstream error ({status}): {message}")]
    Upstream {
        status: StatusCode,
        message: String,
        details: String,
    },

    /// Internal server error
    #[error("Internal server error")]
    InternalServerError,
}

impl ApiError {
    pub fn forbidden(message: impl Into<String>, current_role: Option<Role>) -> Self {
        ApiError::Forbidden {
            message: message.into(),
            current_role,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden { .. } => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Upstream { status, .. } => *status,
            ApiError::LookupFailure(_) | ApiError::InternalServerError => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::Unauthenticated => json!({ "error": "Unauthorized" }),
            ApiError::Forbidden {
                message,
                current_role,
            } => json!({
                "error": message,
                "currentRole": current_role,
            }),
            ApiError::LookupFailure(msg) => json!({
                "error": "Failed to fetch user profile",
                "details": msg,
            }),
            ApiError::BadRequest(msg) | ApiError::NotFound(msg) => json!({ "error": msg }),
            ApiError::Upstream {
                message, details, ..
            } => json!({
                "error": message,
                "details": details,
            }),
            ApiError::InternalServerError => json!({ "error": "Internal server error" }),
        };

        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;
