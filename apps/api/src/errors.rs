use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::evaluation::EvaluationError;
use crate::rubric::RubricStoreError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Decoding error: {0}")]
    Decoding(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Rubric store error: {0}")]
    Rubric(#[from] RubricStoreError),

    #[error("Evaluation error: {0}")]
    Evaluation(#[from] EvaluationError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Decoding(msg) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "DECODING_ERROR",
                msg.clone(),
            ),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Rubric(e) => {
                tracing::error!("Rubric store error: {e}");
                let code = match e {
                    RubricStoreError::NotFound(_) => "RUBRIC_NOT_FOUND",
                    RubricStoreError::Read(_) => "RUBRIC_READ_ERROR",
                    RubricStoreError::Parse(_) => "RUBRIC_PARSE_ERROR",
                    RubricStoreError::Schema(_) => "RUBRIC_SCHEMA_ERROR",
                    RubricStoreError::Write(_) => "RUBRIC_WRITE_ERROR",
                };
                (StatusCode::INTERNAL_SERVER_ERROR, code, e.to_string())
            }
            // The caller gets the textual cause; no partial result ever leaks.
            AppError::Evaluation(e) => {
                tracing::error!("Evaluation error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "EVALUATION_ERROR",
                    e.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
