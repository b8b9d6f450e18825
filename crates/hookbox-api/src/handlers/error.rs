//! Mapping from the error taxonomy to HTTP responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use hookbox_core::HookboxError;
use serde::Serialize;
use tracing::{debug, error};

/// Error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable reason.
    pub detail: String,
}

/// Handler error that renders as `{"detail": ...}` with the mapped status.
#[derive(Debug)]
pub struct ApiError(pub HookboxError);

impl ApiError {
    /// HTTP status for the wrapped error.
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            HookboxError::InvalidSignature => StatusCode::UNAUTHORIZED,
            HookboxError::Validation { .. } | HookboxError::InvalidQuery { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            },
            HookboxError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl From<HookboxError> for ApiError {
    fn from(err: HookboxError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        if self.0.is_client_error() {
            debug!(code = self.0.code(), status = status.as_u16(), "Request rejected");
        } else {
            error!(code = self.0.code(), error = %self.0, "Request failed");
        }

        (status, Json(ErrorResponse { detail: self.0.detail() })).into_response()
    }
}
