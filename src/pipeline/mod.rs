//! Pipeline stages for document text extraction.
//!
//! Each submodule implements exactly one transformation step and is
//! independently testable. The dispatcher in [`crate::extract`] wires them
//! together per document category.
//!
//! ## Data Flow
//!
//! ```text
//! image ─────────────────────▶ preprocess ──▶ encode ──▶ recognize
//! pdf   ──▶ render (per page) ─▶ preprocess ──▶ encode ──▶ recognize
//! docx  ──▶ docx (paragraphs)
//! ```
//!
//! 1. [`render`]     — rasterise every PDF page via pdfium
//! 2. [`preprocess`] — optional grayscale / denoise / brightness / contrast
//! 3. [`encode`]     — lossless PNG for the engine
//! 4. [`recognize`]  — tesseract with a fixed configuration
//! 5. [`docx`]       — paragraph text straight from WordprocessingML

pub mod docx;
pub mod encode;
pub mod preprocess;
pub mod recognize;
pub mod render;
