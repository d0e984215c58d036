//! Error types for the edgequake-ocr library.
//!
//! Every failure of the pipeline is a variant of [`OcrError`]. The variants
//! fall into three groups that callers usually treat differently:
//!
//! * **Rejections**: [`OcrError::UnsupportedMediaType`] and
//!   [`OcrError::PayloadTooLarge`] come from the validation gate before any
//!   expensive work happens.
//! * **Extraction failures**: engine, render, parse and decode errors raised
//!   while a document is being processed. A multi-page document has no
//!   partial-success mode: the first failing page aborts the request.
//! * **Setup errors**: invalid configuration or a missing pdfium library.
//!
//! "No text found" is *not* an error: the recogniser returns an empty string.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T, E = OcrError> = std::result::Result<T, E>;

/// All errors returned by the edgequake-ocr library.
#[derive(Debug, Error)]
pub enum OcrError {
    // ── Validation gate ───────────────────────────────────────────────────
    /// The declared media type is not one of the supported types.
    #[error("Unsupported file type: {media_type}")]
    UnsupportedMediaType { media_type: String },

    /// The upload exceeds the configured size ceiling.
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    // ── Extraction ────────────────────────────────────────────────────────
    /// The recognition engine is unavailable or failed.
    #[error("OCR engine error: {0}")]
    Engine(String),

    /// A PDF page could not be rasterised.
    #[error("Rasterisation failed for page {page}: {detail}")]
    RenderFailed { page: usize, detail: String },

    /// The PDF could not be opened at all.
    #[error("PDF could not be opened: {0}")]
    CorruptPdf(String),

    /// A structured document could not be parsed.
    #[error("Document parsing failed: {0}")]
    ParseFailed(String),

    /// Uploaded image bytes could not be decoded.
    #[error("Image could not be decoded: {0}")]
    ImageDecode(String),

    // ── Setup ─────────────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Set PDFIUM_LIB_PATH=/path/to/libpdfium or install pdfium system-wide."
    )]
    PdfiumBindingFailed(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl OcrError {
    /// True for the two validation-gate rejections.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            OcrError::UnsupportedMediaType { .. } | OcrError::PayloadTooLarge { .. }
        )
    }
}

impl From<image::ImageError> for OcrError {
    fn from(e: image::ImageError) -> Self {
        OcrError::ImageDecode(e.to_string())
    }
}

impl From<zip::result::ZipError> for OcrError {
    fn from(e: zip::result::ZipError) -> Self {
        OcrError::ParseFailed(format!("not a valid .docx archive: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_media_type_display() {
        let e = OcrError::UnsupportedMediaType {
            media_type: "text/plain".into(),
        };
        assert_eq!(e.to_string(), "Unsupported file type: text/plain");
        assert!(e.is_rejection());
    }

    #[test]
    fn payload_too_large_display() {
        let e = OcrError::PayloadTooLarge {
            size: 11,
            limit: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("11"), "got: {msg}");
        assert!(msg.contains("10"), "got: {msg}");
        assert!(e.is_rejection());
    }

    #[test]
    fn render_failed_display() {
        let e = OcrError::RenderFailed {
            page: 3,
            detail: "bitmap".into(),
        };
        assert!(e.to_string().contains("page 3"));
        assert!(!e.is_rejection());
    }

    #[test]
    fn engine_error_is_not_rejection() {
        let e = OcrError::Engine("tesseract not found".into());
        assert!(e.to_string().contains("tesseract not found"));
        assert!(!e.is_rejection());
    }
}
