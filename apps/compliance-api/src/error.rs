//! Error types for the compliance API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use compliance_engine::AuditError;
use serde_json::json;
use shared_types::InvalidFeatureInput;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid feature: {0}")]
    InvalidFeature(#[from] InvalidFeatureInput),

    #[error("Invalid feature at index {index}: {source}")]
    InvalidBatchItem {
        index: usize,
        source: InvalidFeatureInput,
    },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Audit log error: {0}")]
    Audit(#[from] AuditError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidFeature(reason) | ApiError::InvalidBatchItem { source: reason, .. } => {
                match reason {
                    InvalidFeatureInput::MissingTitle => "missing_title",
                    InvalidFeatureInput::MissingDescription => "missing_description",
                }
            }
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::Audit(_) => "audit_unavailable",
            ApiError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::InvalidFeature(_) | ApiError::InvalidBatchItem { .. } => {
                (StatusCode::BAD_REQUEST, self.to_string())
            }
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::Audit(e) => {
                tracing::error!("Audit log error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Audit log unavailable".to_string(),
                )
            }
            ApiError::Internal(e) => {
                tracing::error!("Internal error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": message,
            "code": self.code(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}
