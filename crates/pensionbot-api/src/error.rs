//! API error types and JSON error response formatting.
//!
//! Every error renders as `{ "error": "<message>" }` with a matching HTTP
//! status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use pensionbot_chat::WorkerError;
use pensionbot_core::error::PensionbotError;

/// JSON error response body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Human-readable error message.
    pub error: String,
}

/// API error type that maps to HTTP status codes and JSON responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 400 Bad Request - missing or invalid parameters.
    #[error("{0}")]
    BadRequest(String),
    /// 500 Internal Server Error - worker failure or unexpected server error.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "Request failed");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Worker failures surface their raw diagnostic text.
impl From<WorkerError> for ApiError {
    fn from(err: WorkerError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<PensionbotError> for ApiError {
    fn from(err: PensionbotError) -> Self {
        match err {
            PensionbotError::Config(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(resp: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), 64 * 1024).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bad_request_response() {
        let resp = ApiError::BadRequest("Query is required".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({"error": "Query is required"})
        );
    }

    #[tokio::test]
    async fn test_worker_failure_keeps_stderr_text() {
        let err: ApiError = WorkerError::Failed {
            status: Some(1),
            detail: "Traceback...".to_string(),
        }
        .into();
        let resp = err.into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(resp).await["error"], "Traceback...");
    }

    #[test]
    fn test_from_pensionbot_error() {
        let err: ApiError = PensionbotError::Config("bad port".to_string()).into();
        assert!(matches!(err, ApiError::BadRequest(_)));

        let err: ApiError = PensionbotError::Api("bind".to_string()).into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
