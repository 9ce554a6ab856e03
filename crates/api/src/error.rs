//! API error types with HTTP response mapping.

use std::time::Duration;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::DomainError;
use thiserror::Error;

use crate::envelope::Envelope;

/// API-level error type that maps to enveloped HTTP responses.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be bound to its payload type.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed or invalid bearer token.
    #[error("{0}")]
    Unauthorized(String),

    /// Valid token whose scope lacks the route's role.
    #[error("Insufficient scope.")]
    InsufficientScope,

    /// A business operation failed.
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Any other server-side failure.
    #[error("{0}")]
    Internal(String),

    /// A business operation missed its deadline.
    #[error("operation timed out after {0:?}")]
    Timeout(Duration),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::InsufficientScope => StatusCode::BAD_REQUEST,
            ApiError::Domain(DomainError::Validation(_)) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Domain(_) | ApiError::Internal(_) | ApiError::Timeout(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();

        match self {
            ApiError::InsufficientScope => {
                Envelope::new(status, ()).with_message(message).into_response()
            }
            ApiError::Unauthorized(_) => {
                tracing::warn!(error = %message, "rejected bearer token");
                Envelope::new(status, message).into_response()
            }
            _ if status.is_server_error() => {
                tracing::error!(error = %message, "request failed");
                Envelope::new(status, message).into_response()
            }
            _ => Envelope::new(status, message).into_response(),
        }
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
