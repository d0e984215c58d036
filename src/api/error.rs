//! API error type and its HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::error::OcrError;

use super::types::ErrorResponse;

/// Everything a request can fail with, mapped to a status code and a
/// `{"detail": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or wrong `X-Token` header.
    #[error("Invalid or missing API Token")]
    AuthenticationFailed,

    /// Malformed multipart body, missing `file` part or unparsable field.
    #[error("{0}")]
    InvalidRequest(String),

    /// The request body overran the transport limit while streaming.
    #[error("File too large: request body exceeds the {limit} byte limit")]
    BodyLimitExceeded { limit: usize },

    /// Validation or extraction failure.
    #[error(transparent)]
    Ocr(#[from] OcrError),
}

impl ApiError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        ApiError::InvalidRequest(msg.into())
    }

    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationFailed => StatusCode::FORBIDDEN,
            ApiError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BodyLimitExceeded { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Ocr(OcrError::UnsupportedMediaType { .. }) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            ApiError::Ocr(OcrError::PayloadTooLarge { .. }) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Ocr(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected ({}): {}", status.as_u16(), self);
        }
        let body = ErrorResponse {
            detail: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(ApiError::AuthenticationFailed.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::invalid_request("missing file").status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::from(OcrError::UnsupportedMediaType {
                media_type: "text/plain".into()
            })
            .status(),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            ApiError::from(OcrError::PayloadTooLarge { size: 2, limit: 1 }).status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            ApiError::BodyLimitExceeded { limit: 10 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        for e in [
            OcrError::Engine("gone".into()),
            OcrError::RenderFailed {
                page: 1,
                detail: "x".into(),
            },
            OcrError::ParseFailed("x".into()),
            OcrError::ImageDecode("x".into()),
            OcrError::PdfiumBindingFailed("x".into()),
            OcrError::Internal("x".into()),
        ] {
            assert_eq!(ApiError::from(e).status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn engine_message_passes_through() {
        let err = ApiError::from(OcrError::Engine("tesseract not found".into()));
        assert_eq!(err.to_string(), "OCR engine error: tesseract not found");
    }
}
