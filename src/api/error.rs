use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::warn;

use super::json_response;
use crate::config::LimitError;
use crate::core::RecordError;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid API JSON payload: {0}")]
    InvalidJson(String),

    #[error("Invalid parameter: {field} - {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    #[error("{0}")]
    Limit(#[from] LimitError),

    #[error("Invalid record: {0}")]
    InvalidRecord(#[from] RecordError),

    #[error("Not found")]
    NotFound,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::InvalidJson(_)
            | ApiError::Validation { .. }
            | ApiError::Limit(_)
            | ApiError::InvalidRecord(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
        };
        if status == StatusCode::BAD_REQUEST {
            warn!(error = %self, "rejected API request");
        }
        json_response(
            status,
            ErrorResponse {
                error: self.to_string(),
            },
        )
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
