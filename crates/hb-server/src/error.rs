//! Error-to-HTTP response conversion.
//!
//! Implements `IntoResponse` for [`hb_core::Error`] so that route handlers
//! can return `Result<T, AppError>` and use `?` on store operations.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Wrapper so we can implement `IntoResponse` for an external type.
#[derive(Debug)]
pub struct AppError(hb_core::Error);

impl AppError {
    pub fn inner(&self) -> &hb_core::Error {
        &self.0
    }
}

impl From<hb_core::Error> for AppError {
    fn from(e: hb_core::Error) -> Self {
        Self(e)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                error = %self.0,
                "Server error in API handler"
            );
        }

        let body = json!({
            "error": self.0.to_string(),
            "code": self.0.code(),
        });

        (status, axum::Json(body)).into_response()
    }
}
