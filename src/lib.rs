//! # edgequake-ocr
//!
//! Extract text from uploaded images, PDFs and Word documents, optionally
//! enhancing the pixels first, and serve it over a token-protected HTTP API.
//!
//! ## Pipeline Overview
//!
//! ```text
//! upload (bytes + declared media type + filename)
//!  │
//!  ├─ 1. Validate  supported media type, then size ceiling
//!  ├─ 2. Dispatch  image │ pdf │ docx
//!  ├─ 3. Render    pdf pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 4. Enhance   grayscale → denoise → brightness → contrast
//!  ├─ 5. Recognise tesseract, fixed engine flags
//!  └─ 6. Assemble  units joined by blank lines, `--- Page N ---` markers
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_ocr::{
//!     extract, validate_upload, ExtractionConfig, PreprocessConfig, UploadedDocument,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let bytes = std::fs::read("invoice.pdf")?;
//!     let doc = UploadedDocument::new(bytes, "application/pdf", "invoice.pdf");
//!     validate_upload(&doc.media_type, doc.len(), 5 * 1024 * 1024)?;
//!
//!     let pre = PreprocessConfig { grayscale: true, ..Default::default() };
//!     let result = extract(&doc, &pre, &ExtractionConfig::default()).await?;
//!     println!("{} pages, {} words", result.unit_count, result.word_count());
//!     println!("{}", result.text);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `server` | on | The axum HTTP API in [`api`] |
//! | `cli` | on | Enables the `ocr-server` binary (clap + anyhow + tracing-subscriber) |
//! | `libtesseract` | off | Link libtesseract in-process instead of spawning the `tesseract` CLI |
//!
//! Disable the defaults when using only the library:
//! ```toml
//! edgequake-ocr = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

#[cfg(feature = "server")]
pub mod api;
pub mod config;
pub mod error;
pub mod extract;
pub mod output;
pub mod pipeline;
pub mod validate;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{
    ExtractionConfig, ExtractionConfigBuilder, PreprocessConfig, ServerConfig, ServerConfigBuilder,
};
pub use error::OcrError;
pub use extract::{extract, extract_blocking, ExtractionPath};
pub use output::{Category, ExtractionResult, UploadedDocument};
pub use pipeline::recognize::{TesseractCli, TextRecognizer};
pub use pipeline::render::{PageRasterizer, PdfiumRasterizer};
pub use validate::validate_upload;
