//! API error type and its JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use reef_engine::{EngineError, NodeError};
use reef_erasure::ErasureError;
use reef_store::StoreError;
use serde::Serialize;

/// Errors returned by API handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Authentication failed. Deliberately carries no detail.
    #[error("access denied")]
    AccessDenied,

    /// The request body is not a usable manifest.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] reef_types::ManifestError),

    /// An error from the engine.
    #[error("{0}")]
    Engine(#[from] EngineError),
}

/// JSON body of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl ApiError {
    /// Map to an HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::Manifest(_) => StatusCode::BAD_REQUEST,
            Self::Engine(e) => match e {
                EngineError::Manifest(_) => StatusCode::BAD_REQUEST,
                EngineError::InsufficientShards { .. }
                | EngineError::Erasure(ErasureError::InsufficientShards { .. }) => {
                    StatusCode::SERVICE_UNAVAILABLE
                }
                EngineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
                EngineError::Erasure(ErasureError::PayloadTooLarge { .. }) => {
                    StatusCode::PAYLOAD_TOO_LARGE
                }
                EngineError::Write {
                    source: NodeError::Store(StoreError::InvalidPath { .. }),
                    ..
                } => StatusCode::BAD_REQUEST,
                EngineError::Write { .. } => StatusCode::BAD_GATEWAY,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Short machine-readable error code.
    fn code(&self) -> &'static str {
        match self.status_code() {
            StatusCode::FORBIDDEN => "AccessDenied",
            StatusCode::BAD_REQUEST => "InvalidRequest",
            StatusCode::SERVICE_UNAVAILABLE => "InsufficientShards",
            StatusCode::GATEWAY_TIMEOUT => "Timeout",
            StatusCode::PAYLOAD_TOO_LARGE => "PayloadTooLarge",
            StatusCode::BAD_GATEWAY => "NodeWriteFailed",
            _ => "InternalError",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}
