//! API error response handling

use crate::common::error::GlrError;
use axum::{
    extract::multipart::MultipartError,
    response::{IntoResponse, Response},
    Json,
};

/// Wrapper that converts [`GlrError`] into an HTTP response.
#[derive(Debug)]
pub struct AppError(pub GlrError);

impl From<GlrError> for AppError {
    fn from(err: GlrError) -> Self {
        AppError(err)
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        let status = err.status();
        if status == axum::http::StatusCode::PAYLOAD_TOO_LARGE {
            AppError(GlrError::PayloadTooLarge(err.body_text()))
        } else {
            AppError(GlrError::validation(format!(
                "malformed multipart body: {}",
                err.body_text()
            )))
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // external_message() で内部情報（パス等）を隠す。詳細はログに残す
        let status = self.0.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self.0, status = status.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, status = status.as_u16(), "Request rejected");
        }

        (status, Json(self.0.to_error_response())).into_response()
    }
}
