//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use poise_models::AnalysisError;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

/// Body text that replaces internal error detail in production.
const INTERNAL_ERROR_MESSAGE: &str = "An internal error occurred";

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Analysis(e) => match e {
                AnalysisError::InvalidReference(_) => StatusCode::BAD_REQUEST,
                AnalysisError::SourceFetchFailed(_) | AnalysisError::ScoringUnavailable(_) => {
                    StatusCode::BAD_GATEWAY
                }
                AnalysisError::InvalidMediaMetadata(_) | AnalysisError::NoFramesExtracted(_) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                AnalysisError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Machine-readable error code returned in the body.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "bad_request",
            ApiError::RateLimited => "rate_limited",
            ApiError::Timeout(_) => "timeout",
            ApiError::Analysis(AnalysisError::InvalidReference(_)) => "bad_request",
            ApiError::Analysis(e) => e.code(),
        }
    }

    /// Replace internal error detail with a generic message when `hide_internal` is set.
    ///
    /// The original detail is logged before it is dropped.
    pub fn redacted(self, hide_internal: bool) -> Self {
        match self {
            ApiError::Analysis(AnalysisError::Internal(detail)) if hide_internal => {
                tracing::error!(detail = %detail, "Internal error");
                ApiError::Analysis(AnalysisError::Internal(INTERNAL_ERROR_MESSAGE.to_string()))
            }
            other => other,
        }
    }
}

/// Error body returned by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.code(), "{}", self);
        }

        let error = match &self {
            ApiError::Analysis(AnalysisError::Internal(msg)) => msg.clone(),
            ApiError::BadRequest(msg) => msg.clone(),
            other => other.to_string(),
        };

        let body = ErrorResponse {
            error,
            code: self.code().to_string(),
        };

        (status, Json(body)).into_response()
    }
}
