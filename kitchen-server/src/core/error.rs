use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::orders::StorageError;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, error_type, message, details) = match &self {
            ServerError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "not_found",
                self.to_string(),
                Some(what.clone()),
            ),
            ServerError::Storage(err) => {
                tracing::error!(error = %err, "Storage error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "storage_error",
                    "Order storage unavailable".to_string(),
                    None,
                )
            }
            ServerError::Internal(err) => {
                // Log internal errors without exposing details
                tracing::error!(error = ?err, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Handler result type
pub type Result<T> = std::result::Result<T, ServerError>;
