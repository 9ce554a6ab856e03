//! Uniform `{code, message, data}` response body.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Response wrapper used by every `/v1` endpoint. `code` repeats the HTTP
/// status and `message` carries its canonical reason phrase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Envelope<T> {
    #[schema(example = 200)]
    pub code: u16,
    #[schema(example = "OK")]
    pub message: String,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(status: StatusCode, data: T) -> Self {
        Self {
            code: status.as_u16(),
            message: status.canonical_reason().unwrap_or_default().to_string(),
            data,
        }
    }

    /// 200 OK.
    pub fn ok(data: T) -> Self {
        Self::new(StatusCode::OK, data)
    }

    /// 201 Created.
    pub fn created(data: T) -> Self {
        Self::new(StatusCode::CREATED, data)
    }

    /// Replaces the reason phrase.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_phrase() {
        let envelope = Envelope::created("bc01");
        assert_eq!(envelope.code, 201);
        assert_eq!(envelope.message, "Created");

        let json = serde_json::to_value(Envelope::ok(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!({"code": 200, "message": "OK", "data": [1, 2]}));
    }

    #[test]
    fn test_status_comes_from_code() {
        let response = Envelope::new(StatusCode::BAD_REQUEST, ()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
