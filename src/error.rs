//! Error taxonomy for the marketplace API.
//!
//! Every service operation returns a typed [`ApiError`]; the axum boundary maps
//! each variant to its HTTP status and a JSON `{"error": ...}` body. Store-level
//! constraint violations are translated into [`ApiError::Duplicate`] before they
//! reach a caller, and internal failures are logged but surfaced with a generic
//! message only.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Required field missing or malformed (400).
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist (404).
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    /// Unique constraint violated (400), e.g. two categories deriving the
    /// same slug.
    #[error("{entity} with this {field} already exists")]
    Duplicate {
        entity: &'static str,
        field: &'static str,
    },

    /// Admin operation attempted without a valid session (401).
    #[error("unauthorized")]
    Unauthorized,

    /// Unexpected store or I/O failure (500). The source is logged, never
    /// returned to the caller.
    #[error("internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    /// Validation error naming the fields that are required but missing.
    pub fn missing_fields(fields: &[&str]) -> Self {
        let list = fields.join(", ");
        ApiError::Validation(format!("{list} are required"))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::Duplicate { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Classification label used by error metrics.
    pub fn category(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation_error",
            ApiError::NotFound { .. } => "not_found",
            ApiError::Duplicate { .. } => "duplicate_key",
            ApiError::Unauthorized => "unauthorized",
            ApiError::Internal(_) => "server_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(source) = &self {
            tracing::error!(error = ?source, "internal error");
        }
        crate::metrics::METRICS.record_api_error(self.category());
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Require a non-empty, non-whitespace string field.
pub fn require(field: &'static str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} is required")));
    }
    Ok(())
}
