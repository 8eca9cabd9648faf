//! API error handling module
//!
//! Provides a unified error type for all API endpoints with structured
//! error variants. Internal details are logged; 5xx responses carry an
//! intentionally generic client message.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use certiva_core::CertivaError;
use thiserror::Error;

/// API error type with structured variants for different error categories
#[derive(Debug, Error)]
pub enum ApiError {
    /// Bad request - client provided invalid input
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Not found - requested resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Conflict - resource already exists
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Payload too large - upload exceeds the configured limit
    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    /// Internal server error - unexpected server-side failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable - required collaborator is not configured or
    /// cannot be reached
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// Certiva core error - error from the decision engine
    #[error("Certiva error: {0}")]
    Core(#[from] CertivaError),
}

impl ApiError {
    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a payload too large error
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge(message.into())
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a service unavailable error
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Core(ref e) => match e {
                // Client-provided invalid input → 400
                CertivaError::InvalidEmbedding(_)
                | CertivaError::InvalidThreshold(_)
                | CertivaError::InvalidHash(_)
                | CertivaError::InvalidAddress(_)
                | CertivaError::ImageUnreadable(_)
                | CertivaError::EmbeddingUnavailable(_) => StatusCode::BAD_REQUEST,

                // Append-only conflict → 409
                CertivaError::DuplicateRecord(_) => StatusCode::CONFLICT,

                // Collaborator failures → 503
                CertivaError::LedgerUnavailable(_)
                | CertivaError::ExtractionUnavailable(_)
                | CertivaError::DetectorUnavailable(_)
                | CertivaError::OcrUnavailable(_)
                | CertivaError::Http(_) => StatusCode::SERVICE_UNAVAILABLE,

                // Internal processing failures → 500
                CertivaError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }

    /// Get the error code for programmatic error handling
    fn error_code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "INVALID_INPUT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::PayloadTooLarge(_) => "PAYLOAD_TOO_LARGE",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
            Self::Core(ref e) => match e {
                CertivaError::InvalidEmbedding(_) => "INVALID_EMBEDDING",
                CertivaError::InvalidThreshold(_) => "INVALID_THRESHOLD",
                CertivaError::InvalidHash(_) => "INVALID_HASH",
                CertivaError::InvalidAddress(_) => "INVALID_ADDRESS",
                CertivaError::ImageUnreadable(_) => "IMAGE_UNREADABLE",
                CertivaError::EmbeddingUnavailable(_) => "NO_REGION_DETECTED",
                CertivaError::DuplicateRecord(_) => "DUPLICATE_RECORD",
                CertivaError::LedgerUnavailable(_) => "LEDGER_UNAVAILABLE",
                CertivaError::ExtractionUnavailable(_) => "EXTRACTION_UNAVAILABLE",
                CertivaError::DetectorUnavailable(_) => "DETECTOR_UNAVAILABLE",
                CertivaError::OcrUnavailable(_) => "OCR_UNAVAILABLE",
                CertivaError::Http(_) => "UPSTREAM_ERROR",
                CertivaError::Io(_) => "PROCESSING_ERROR",
            },
        }
    }

    /// Get sanitized error message for client response
    fn client_message(&self) -> String {
        match self {
            // Never leak internal processing details
            Self::Internal(_) => "Internal processing error".to_string(),
            Self::Core(ref e) => match e {
                CertivaError::Io(_) => "Internal processing error".to_string(),
                CertivaError::Http(_) => "Upstream service error".to_string(),
                other => other.to_string(),
            },
            _ => self.to_string(),
        }
    }

    /// Get the error category for logging
    fn error_category(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::NotFound(_) => "not_found",
            Self::Conflict(_) => "conflict",
            Self::PayloadTooLarge(_) => "payload_too_large",
            Self::Internal(_) => "internal",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Core(_) => "core",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let category = self.error_category();
        let code = self.error_code();
        let internal_message = self.to_string();
        let client_message = self.client_message();

        // Log based on severity, always including internal details
        if status.is_server_error() {
            tracing::error!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Server error"
            );
        } else {
            tracing::warn!(
                status = %status,
                category = category,
                code = code,
                error = %internal_message,
                "Client error"
            );
        }

        // All error responses include a `code` field for programmatic
        // error handling
        let body = serde_json::json!({
            "error": client_message,
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::bad_request("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::payload_too_large("x").status_code(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::from(CertivaError::InvalidHash("x".into())).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(CertivaError::DuplicateRecord("x".into())).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(CertivaError::LedgerUnavailable("x".into())).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_internal_message_is_generic() {
        let err = ApiError::internal("sqlite file corrupted at offset 42");
        assert_eq!(err.client_message(), "Internal processing error");

        let err = ApiError::from(CertivaError::Io(std::io::Error::other("disk details")));
        assert_eq!(err.client_message(), "Internal processing error");
    }
}
