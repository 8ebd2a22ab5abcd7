//! HTTP error responses

use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    InvalidRequest(String),
    NotFound(String),
    Conflict(String),
    InternalError(String),
}

impl From<reviewsense_core::Error> for AppError {
    fn from(err: reviewsense_core::Error) -> Self {
        use reviewsense_core::Error;

        match err {
            Error::MissingField(_) | Error::InvalidField { .. } | Error::UnseenLabel(_) => {
                AppError::InvalidRequest(err.to_string())
            }
            other => AppError::InternalError(other.to_string()),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => AppError::NotFound("Review not found.".to_string()),
            StoreError::Duplicate(id) => {
                AppError::Conflict(format!("Review {} already exists", id))
            }
            StoreError::Invalid(e) => e.into(),
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            AppError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "invalid_request_error", msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found_error", msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "conflict_error", msg),
            AppError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg)
            }
        };

        metrics::counter!("reviewsense_errors_total", "type" => kind).increment(1);

        let body = json!({
            "error": {
                "message": message,
                "type": kind,
            }
        });

        (status, Json(body)).into_response()
    }
}
