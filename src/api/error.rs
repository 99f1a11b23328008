//! Error responses for the books API

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::database::StoreError;

/// Body of every error response
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
    pub code: &'static str,
}

/// API error types that map to HTTP responses
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid or missing API key")]
    Unauthorized,

    /// Duplicate title on create; answered with 400
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => Self::Conflict(err.to_string()),
            StoreError::NotFound(_) => Self::NotFound(err.to_string()),
            other => Self::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, detail) = match self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                Self::Unauthorized.to_string(),
            ),
            Self::Conflict(detail) => (StatusCode::BAD_REQUEST, "conflict", detail),
            Self::NotFound(detail) => (StatusCode::NOT_FOUND, "not_found", detail),
            Self::Internal(err) => {
                tracing::error!(error = ?err, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { detail, code })).into_response()
    }
}
