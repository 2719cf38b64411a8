//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! `GlrError`は`error_type()`と`status_code()`メソッドを提供し、
//! APIレイヤーで統一形式のエラーレスポンスを生成できます。

use axum::http::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Common layer error type
#[derive(Debug, Error)]
pub enum CommonError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

/// GLRChain backend error type
#[derive(Debug, Error)]
pub enum GlrError {
    /// Common layer error
    #[error(transparent)]
    Common(#[from] CommonError),

    /// Metadata value that has no canonical representation
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Failure persisting an evidence bundle
    #[error("Storage write error: {0}")]
    StorageWrite(String),

    /// Referenced evidence file vanished before it could be read
    #[error("Missing evidence file: {0}")]
    MissingEvidence(String),

    /// Upload or file exceeds the configured bound
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(String),

    /// Field encryption error
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Password hash error
    #[error("Password hash error: {0}")]
    PasswordHash(String),

    /// JWT error
    #[error("JWT error: {0}")]
    Jwt(String),

    /// Authentication error
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Authorization error
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Conflict error (e.g., duplicate username)
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Result alias used across the crate
pub type GlrResult<T> = Result<T, GlrError>;

impl GlrError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Common(CommonError::Validation(message.into()))
    }

    /// Returns a safe error message for external clients.
    ///
    /// Caller-facing failures (validation, canonicalization, size limits,
    /// conflicts) carry the detailed message since it only describes the
    /// caller's own input. Everything else returns a fixed string; the full
    /// error goes to the server log.
    pub fn external_message(&self) -> String {
        match self {
            Self::Common(CommonError::Validation(msg)) => msg.clone(),
            Self::Common(_) => "Request error".to_string(),
            Self::Serialization(msg) => msg.clone(),
            Self::PayloadTooLarge(msg) => msg.clone(),
            Self::Conflict(msg) => msg.clone(),
            Self::StorageWrite(_) => "Evidence storage unavailable".to_string(),
            Self::MissingEvidence(_) => "Evidence file not found".to_string(),
            Self::NotFound(_) => "Not found".to_string(),
            Self::Database(_) => "Database error".to_string(),
            Self::Crypto(_) => "Internal server error".to_string(),
            Self::Internal(_) => "Internal server error".to_string(),
            Self::PasswordHash(_) => "Internal server error".to_string(),
            Self::Jwt(_) => "Authentication error".to_string(),
            Self::Authentication(_) => "Authentication failed".to_string(),
            Self::Authorization(_) => "Access denied".to_string(),
        }
    }

    /// Returns the error type string used in response bodies.
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Common(_) => "invalid_request_error",
            Self::Serialization(_) => "invalid_request_error",
            Self::MissingEvidence(_) => "invalid_request_error",
            Self::PayloadTooLarge(_) => "invalid_request_error",
            Self::Conflict(_) => "invalid_request_error",
            Self::NotFound(_) => "not_found_error",
            Self::StorageWrite(_) => "service_unavailable",
            Self::Database(_) => "server_error",
            Self::Crypto(_) => "server_error",
            Self::Internal(_) => "server_error",
            Self::PasswordHash(_) => "server_error",
            Self::Jwt(_) => "authentication_error",
            Self::Authentication(_) => "authentication_error",
            Self::Authorization(_) => "permission_error",
        }
    }

    /// Returns the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Common(_) => StatusCode::BAD_REQUEST,
            Self::Serialization(_) => StatusCode::BAD_REQUEST,
            Self::MissingEvidence(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // ストレージ障害は呼び出し側で再試行可能
            Self::StorageWrite(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Crypto(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::PasswordHash(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Jwt(_) => StatusCode::UNAUTHORIZED,
            Self::Authentication(_) => StatusCode::UNAUTHORIZED,
            Self::Authorization(_) => StatusCode::FORBIDDEN,
        }
    }

    /// Converts this error to the JSON error body.
    pub fn to_error_response(&self) -> ErrorResponse {
        ErrorResponse {
            error: ErrorDetail {
                message: self.external_message(),
                error_type: self.error_type().to_string(),
                code: Some(self.status_code().as_u16().to_string()),
            },
        }
    }
}

/// エラーレスポンス
///
/// # Example
///
/// ```json
/// {
///   "error": {
///     "message": "meta.lat: NaN has no canonical representation",
///     "type": "invalid_request_error",
///     "code": "400"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// The error details
    pub error: ErrorDetail,
}

/// エラー詳細
#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    /// Human-readable error message
    pub message: String,
    /// Error type (e.g., "invalid_request_error", "server_error")
    #[serde(rename = "type")]
    pub error_type: String,
    /// Error code (HTTP status as string)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
