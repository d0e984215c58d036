//! Validation gate: cheap checks that run before any decoding or OCR.
//!
//! Media type is checked before size, so an oversized file of an
//! unsupported type is reported as [`OcrError::UnsupportedMediaType`].

use crate::error::OcrError;
use crate::output::Category;
use tracing::debug;

/// Media types accepted by the service.
pub const SUPPORTED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "application/pdf",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
];

impl Category {
    /// Map a declared media type to its category.
    ///
    /// Matching ignores ASCII case and any `;`-separated parameters.
    /// Returns `None` for unsupported types.
    pub fn from_media_type(media_type: &str) -> Option<Category> {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" | "image/png" => Some(Category::Image),
            "application/pdf" => Some(Category::Pdf),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => {
                Some(Category::WordDocument)
            }
            _ => None,
        }
    }
}

/// Check an upload against the supported types and the size ceiling.
///
/// Returns the document's category on success. `byte_len == max_bytes`
/// is accepted.
pub fn validate_upload(
    media_type: &str,
    byte_len: usize,
    max_bytes: usize,
) -> Result<Category, OcrError> {
    let category =
        Category::from_media_type(media_type).ok_or_else(|| OcrError::UnsupportedMediaType {
            media_type: media_type.to_string(),
        })?;

    if byte_len > max_bytes {
        return Err(OcrError::PayloadTooLarge {
            size: byte_len,
            limit: max_bytes,
        });
    }

    debug!(
        "Upload accepted: {} ({} bytes) as {}",
        media_type, byte_len, category
    );
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIMIT: usize = 5 * 1024 * 1024;

    #[test]
    fn every_supported_type_is_accepted() {
        for media_type in SUPPORTED_MEDIA_TYPES {
            assert!(
                validate_upload(media_type, 10, LIMIT).is_ok(),
                "{media_type} should be accepted"
            );
        }
    }

    #[test]
    fn categories_are_derived_from_media_type() {
        assert_eq!(Category::from_media_type("image/jpg"), Some(Category::Image));
        assert_eq!(Category::from_media_type("image/png"), Some(Category::Image));
        assert_eq!(Category::from_media_type("application/pdf"), Some(Category::Pdf));
        assert_eq!(
            Category::from_media_type(
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            ),
            Some(Category::WordDocument)
        );
        assert_eq!(Category::from_media_type("image/gif"), None);
        assert_eq!(Category::from_media_type(""), None);
    }

    #[test]
    fn media_type_parameters_and_case_are_ignored() {
        assert_eq!(
            Category::from_media_type("Image/PNG; charset=binary"),
            Some(Category::Image)
        );
    }

    #[test]
    fn exact_limit_is_accepted() {
        assert_eq!(
            validate_upload("image/png", LIMIT, LIMIT).unwrap(),
            Category::Image
        );
    }

    #[test]
    fn one_byte_over_limit_is_rejected() {
        let err = validate_upload("image/png", LIMIT + 1, LIMIT).unwrap_err();
        let OcrError::PayloadTooLarge { size, limit } = &err else {
            panic!("got {err:?}");
        };
        assert_eq!((*size, *limit), (LIMIT + 1, LIMIT));
    }

    #[test]
    fn text_plain_is_rejected_regardless_of_size() {
        for size in [0, 1, LIMIT, LIMIT + 1, usize::MAX] {
            let err = validate_upload("text/plain", size, LIMIT).unwrap_err();
            let OcrError::UnsupportedMediaType { media_type } = &err else {
                panic!("size {size}: got {err:?}");
            };
            assert_eq!(media_type, "text/plain");
        }
    }
}
