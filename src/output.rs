//! Input and output types of an extraction.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal classification of a supported document, derived from its
/// declared media type by [`Category::from_media_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// JPEG or PNG image: one recognition unit.
    #[serde(rename = "IMG")]
    Image,
    /// PDF: one recognition unit per rendered page.
    #[serde(rename = "PDF")]
    Pdf,
    /// Word `.docx`: paragraphs read directly, no recognition.
    #[serde(rename = "DOCX")]
    WordDocument,
}

impl Category {
    /// Short upper-case label reported to API clients.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Image => "IMG",
            Category::Pdf => "PDF",
            Category::WordDocument => "DOCX",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A document as received from a caller. Never mutated after construction.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    /// Raw file contents.
    pub data: Bytes,
    /// Media type declared by the caller (not sniffed).
    pub media_type: String,
    /// Original filename as supplied by the caller.
    pub filename: String,
}

impl UploadedDocument {
    pub fn new(
        data: impl Into<Bytes>,
        media_type: impl Into<String>,
        filename: impl Into<String>,
    ) -> Self {
        Self {
            data: data.into(),
            media_type: media_type.into(),
            filename: filename.into(),
        }
    }

    /// Size of the contents in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extension of the filename including the leading dot, or `""`.
    ///
    /// Derived from the name only; a `.png` file declared as PDF still
    /// reports `.png`.
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.filename)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}

/// Result of extracting one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Unit texts joined by blank lines, trimmed.
    pub text: String,
    /// Number of units (images or pages) that produced a fragment.
    pub unit_count: usize,
    /// Category the document was dispatched as.
    pub category: Category,
}

impl ExtractionResult {
    /// Whitespace-separated word count of the combined text.
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_labels() {
        assert_eq!(Category::Image.to_string(), "IMG");
        assert_eq!(Category::Pdf.label(), "PDF");
        assert_eq!(
            serde_json::to_string(&Category::WordDocument).unwrap(),
            "\"DOCX\""
        );
    }

    #[test]
    fn extension_comes_from_filename() {
        let doc = UploadedDocument::new(vec![1, 2, 3], "application/pdf", "scan.final.PNG");
        assert_eq!(doc.extension(), ".PNG");
        assert_eq!(doc.len(), 3);

        let bare = UploadedDocument::new(Vec::new(), "image/png", "README");
        assert_eq!(bare.extension(), "");
        assert!(bare.is_empty());

        let dotfile = UploadedDocument::new(Vec::new(), "image/png", ".hidden");
        assert_eq!(dotfile.extension(), "");
    }

    #[test]
    fn word_count_splits_on_any_whitespace() {
        let result = ExtractionResult {
            text: "--- Page 1 ---\nHELLO\tworld\n\nagain".into(),
            unit_count: 1,
            category: Category::Pdf,
        };
        assert_eq!(result.word_count(), 7);
    }
}
