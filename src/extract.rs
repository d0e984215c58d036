//! Document classification and dispatch.
//!
//! [`extract`] maps an upload's declared media type to a [`Category`], picks
//! the extraction path for it and assembles the final text:
//!
//! | Category | Path |
//! |----------|------|
//! | image | decode → preprocess → recognise (one unit) |
//! | pdf | rasterise → per page: preprocess → recognise, prefixed `--- Page N ---` |
//! | docx | paragraphs joined by `\n` (one unit, no recognition) |
//!
//! Units are joined by a blank line and the whole result is trimmed.
//!
//! The pipeline is blocking end to end. [`extract`] moves it onto tokio's
//! blocking pool so request-accepting tasks never wait on pdfium or
//! tesseract; [`extract_blocking`] is the same work on the calling thread.

use crate::config::{ExtractionConfig, PreprocessConfig};
use crate::error::{OcrError, Result};
use crate::output::{Category, ExtractionResult, UploadedDocument};
use crate::pipeline::docx;
use crate::pipeline::preprocess::preprocess;
use crate::pipeline::recognize::{resolve_recognizer, TextRecognizer};
use crate::pipeline::render::resolve_rasterizer;
use image::DynamicImage;
use std::time::Instant;
use tracing::{debug, info};

/// Separator placed between unit texts.
const UNIT_SEPARATOR: &str = "\n\n";

/// The three extraction strategies, each borrowing the raw bytes.
#[derive(Debug, Clone, Copy)]
pub enum ExtractionPath<'a> {
    /// Decode one image and recognise it.
    Image(&'a [u8]),
    /// Render each page to an image and recognise every page.
    MultiPageRaster(&'a [u8]),
    /// Read paragraphs from a structured document.
    StructuredText(&'a [u8]),
}

impl<'a> ExtractionPath<'a> {
    /// Pick the path for a declared media type.
    pub fn for_media_type(media_type: &str, bytes: &'a [u8]) -> Result<Self> {
        let category =
            Category::from_media_type(media_type).ok_or_else(|| OcrError::UnsupportedMediaType {
                media_type: media_type.to_string(),
            })?;
        Ok(Self::for_category(category, bytes))
    }

    pub fn for_category(category: Category, bytes: &'a [u8]) -> Self {
        match category {
            Category::Image => ExtractionPath::Image(bytes),
            Category::Pdf => ExtractionPath::MultiPageRaster(bytes),
            Category::WordDocument => ExtractionPath::StructuredText(bytes),
        }
    }

    pub fn category(&self) -> Category {
        match self {
            ExtractionPath::Image(_) => Category::Image,
            ExtractionPath::MultiPageRaster(_) => Category::Pdf,
            ExtractionPath::StructuredText(_) => Category::WordDocument,
        }
    }
}

/// Extract the text of `document` on tokio's blocking pool.
///
/// # Example
/// ```rust,no_run
/// use edgequake_ocr::{extract, ExtractionConfig, PreprocessConfig, UploadedDocument};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let bytes = std::fs::read("scan.png")?;
/// let doc = UploadedDocument::new(bytes, "image/png", "scan.png");
/// let result = extract(&doc, &PreprocessConfig::default(), &ExtractionConfig::default()).await?;
/// println!("{}", result.text);
/// # Ok(())
/// # }
/// ```
pub async fn extract(
    document: &UploadedDocument,
    preprocess_config: &PreprocessConfig,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    let document = document.clone();
    let preprocess_config = *preprocess_config;
    let config = config.clone();

    tokio::task::spawn_blocking(move || extract_blocking(&document, &preprocess_config, &config))
        .await
        .map_err(|e| OcrError::Internal(format!("extraction task failed: {e}")))?
}

/// Extract the text of `document` on the current thread.
///
/// The media type is expected to have passed
/// [`validate_upload`](crate::validate::validate_upload); anything else is
/// still rejected with [`OcrError::UnsupportedMediaType`].
pub fn extract_blocking(
    document: &UploadedDocument,
    preprocess_config: &PreprocessConfig,
    config: &ExtractionConfig,
) -> Result<ExtractionResult> {
    let start = Instant::now();
    let path = ExtractionPath::for_media_type(&document.media_type, &document.data)?;
    let category = path.category();
    debug!(
        "Dispatching '{}' ({} bytes) as {}",
        document.filename,
        document.len(),
        category
    );

    let units = match path {
        ExtractionPath::Image(bytes) => {
            let recognizer = resolve_recognizer(config);
            let image = image::load_from_memory(bytes)?;
            vec![recognize_unit(recognizer.as_ref(), &image, preprocess_config)?]
        }
        ExtractionPath::MultiPageRaster(bytes) => {
            let recognizer = resolve_recognizer(config);
            let pages = resolve_rasterizer(config).rasterize(bytes)?;
            let mut units = Vec::with_capacity(pages.len());
            for (idx, page) in pages.iter().enumerate() {
                let text = recognize_unit(recognizer.as_ref(), page, preprocess_config)?;
                units.push(format!("{}\n{}", page_marker(idx + 1), text));
            }
            units
        }
        ExtractionPath::StructuredText(bytes) => vec![docx::extract_text(bytes)?],
    };

    let result = ExtractionResult {
        text: units.join(UNIT_SEPARATOR).trim().to_string(),
        unit_count: units.len(),
        category,
    };

    info!(
        "Extracted {} unit(s) from '{}' as {} in {}ms",
        result.unit_count,
        document.filename,
        category,
        start.elapsed().as_millis()
    );
    Ok(result)
}

/// `--- Page N ---`, 1-indexed.
pub fn page_marker(page_num: usize) -> String {
    format!("--- Page {} ---", page_num)
}

fn recognize_unit(
    recognizer: &dyn TextRecognizer,
    image: &DynamicImage,
    preprocess_config: &PreprocessConfig,
) -> Result<String> {
    if preprocess_config.is_neutral() {
        recognizer.recognize(image)
    } else {
        recognizer.recognize(&preprocess(image, preprocess_config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::docx::tests::docx_with_paragraphs;
    use crate::pipeline::encode::encode_png;
    use crate::pipeline::render::PageRasterizer;
    use image::{GenericImageView, Rgb, RgbImage};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Returns a scripted text per call and records what it saw.
    #[derive(Default)]
    struct ScriptedRecognizer {
        texts: Vec<&'static str>,
        fail_on_call: Option<usize>,
        calls: AtomicUsize,
        seen_grey: Mutex<Vec<bool>>,
    }

    impl ScriptedRecognizer {
        fn new(texts: &[&'static str]) -> Arc<Self> {
            Arc::new(Self {
                texts: texts.to_vec(),
                ..Default::default()
            })
        }

        /// Like `new`, but the call with 1-based index `call` fails.
        fn failing_on(texts: &[&'static str], call: usize) -> Arc<Self> {
            Arc::new(Self {
                texts: texts.to_vec(),
                fail_on_call: Some(call),
                ..Default::default()
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextRecognizer for ScriptedRecognizer {
        fn name(&self) -> &str {
            "scripted"
        }

        fn recognize(&self, image: &DynamicImage) -> Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on_call == Some(n + 1) {
                return Err(OcrError::Engine(format!("engine crashed on call {}", n + 1)));
            }
            self.seen_grey
                .lock()
                .unwrap()
                .push(matches!(image, DynamicImage::ImageLuma8(_)));
            Ok(self.texts.get(n).copied().unwrap_or_default().to_string())
        }
    }

    /// Produces `pages` blank pages, or fails on `fail_on`.
    struct FakeRasterizer {
        pages: usize,
        fail_on: Option<usize>,
        calls: AtomicUsize,
    }

    impl FakeRasterizer {
        fn new(pages: usize) -> Arc<Self> {
            Arc::new(Self {
                pages,
                fail_on: None,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl PageRasterizer for FakeRasterizer {
        fn rasterize(&self, _document: &[u8]) -> Result<Vec<DynamicImage>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(page) = self.fail_on {
                return Err(OcrError::RenderFailed {
                    page,
                    detail: "bitmap allocation failed".into(),
                });
            }
            Ok((0..self.pages)
                .map(|_| DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]))))
                .collect())
        }
    }

    fn config_with(
        recognizer: Arc<ScriptedRecognizer>,
        rasterizer: Arc<FakeRasterizer>,
    ) -> ExtractionConfig {
        ExtractionConfig::builder()
            .recognizer(recognizer)
            .rasterizer(rasterizer)
            .build()
            .unwrap()
    }

    fn png_bytes() -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(6, 4, Rgb([200, 30, 30])));
        encode_png(&img).unwrap()
    }

    #[test]
    fn image_is_one_unit() {
        let rec = ScriptedRecognizer::new(&["  HELLO \n"]);
        let config = config_with(rec.clone(), FakeRasterizer::new(0));
        let doc = UploadedDocument::new(png_bytes(), "image/png", "hello.png");

        let result = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap();
        assert_eq!(result.text, "HELLO");
        assert_eq!(result.unit_count, 1);
        assert_eq!(result.category, Category::Image);
        assert_eq!(rec.calls(), 1);
    }

    #[test]
    fn image_is_preprocessed_before_recognition() {
        let rec = ScriptedRecognizer::new(&["x"]);
        let config = config_with(rec.clone(), FakeRasterizer::new(0));
        let doc = UploadedDocument::new(png_bytes(), "image/jpeg", "a.jpg");
        let pre = PreprocessConfig {
            grayscale: true,
            ..Default::default()
        };

        extract_blocking(&doc, &pre, &config).unwrap();
        assert_eq!(*rec.seen_grey.lock().unwrap(), vec![true]);
    }

    #[test]
    fn undecodable_image_fails() {
        let rec = ScriptedRecognizer::new(&[]);
        let config = config_with(rec.clone(), FakeRasterizer::new(0));
        let doc = UploadedDocument::new(b"not an image".to_vec(), "image/png", "x.png");

        let err = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap_err();
        assert!(matches!(err, OcrError::ImageDecode(_)), "got {err:?}");
        assert_eq!(rec.calls(), 0);
    }

    #[test]
    fn pdf_pages_are_marked_in_order() {
        let rec = ScriptedRecognizer::new(&["alpha", "beta", "gamma"]);
        let raster = FakeRasterizer::new(3);
        let config = config_with(rec.clone(), raster.clone());
        let doc = UploadedDocument::new(b"%PDF-1.7".to_vec(), "application/pdf", "three.pdf");

        let result = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap();
        assert_eq!(
            result.text,
            "--- Page 1 ---\nalpha\n\n--- Page 2 ---\nbeta\n\n--- Page 3 ---\ngamma"
        );
        assert_eq!(result.unit_count, 3);
        assert_eq!(result.category, Category::Pdf);
        assert_eq!(rec.calls(), 3);
        assert_eq!(raster.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn blank_pdf_pages_are_kept() {
        let rec = ScriptedRecognizer::new(&["", "text", ""]);
        let config = config_with(rec, FakeRasterizer::new(3));
        let doc = UploadedDocument::new(b"%PDF".to_vec(), "application/pdf", "p.pdf");

        let result = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap();
        assert_eq!(result.unit_count, 3);
        assert_eq!(result.text.matches("--- Page").count(), 3);
        assert!(result.text.ends_with("--- Page 3 ---"));
    }

    #[test]
    fn pdf_render_failure_is_fatal() {
        let rec = ScriptedRecognizer::new(&["never"]);
        let raster = Arc::new(FakeRasterizer {
            pages: 4,
            fail_on: Some(2),
            calls: AtomicUsize::new(0),
        });
        let config = config_with(rec.clone(), raster);
        let doc = UploadedDocument::new(b"%PDF".to_vec(), "application/pdf", "bad.pdf");

        let err = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap_err();
        assert!(matches!(err, OcrError::RenderFailed { page: 2, .. }));
        assert_eq!(rec.calls(), 0);
    }

    #[test]
    fn later_page_recognition_failure_fails_whole_document() {
        let rec = ScriptedRecognizer::failing_on(&["first", "second", "third"], 2);
        let config = config_with(rec.clone(), FakeRasterizer::new(3));
        let doc = UploadedDocument::new(b"%PDF".to_vec(), "application/pdf", "three.pdf");

        let err = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap_err();
        assert!(matches!(err, OcrError::Engine(ref m) if m.contains("call 2")), "got {err:?}");
        assert!(!err.to_string().contains("first"));
        assert_eq!(rec.calls(), 2);
    }

    #[test]
    fn docx_never_touches_engines() {
        let rec = ScriptedRecognizer::new(&["unused"]);
        let raster = FakeRasterizer::new(1);
        let config = config_with(rec.clone(), raster.clone());
        let doc = UploadedDocument::new(
            docx_with_paragraphs(&["Quarterly report", "Revenue grew"]),
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "report.docx",
        );
        let pre = PreprocessConfig {
            grayscale: true,
            denoise: true,
            ..Default::default()
        };

        let result = extract_blocking(&doc, &pre, &config).unwrap();
        assert_eq!(result.text, "Quarterly report\nRevenue grew");
        assert_eq!(result.unit_count, 1);
        assert_eq!(result.category, Category::WordDocument);
        assert_eq!(rec.calls(), 0);
        assert_eq!(raster.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn empty_text_is_success() {
        let rec = ScriptedRecognizer::new(&["   \n"]);
        let config = config_with(rec, FakeRasterizer::new(0));
        let doc = UploadedDocument::new(png_bytes(), "image/png", "blank.png");

        let result = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.word_count(), 0);
        assert_eq!(result.unit_count, 1);
    }

    #[test]
    fn unsupported_type_is_rejected() {
        let rec = ScriptedRecognizer::new(&[]);
        let config = config_with(rec.clone(), FakeRasterizer::new(1));
        let doc = UploadedDocument::new(b"hello".to_vec(), "text/plain", "a.txt");

        let err = extract_blocking(&doc, &PreprocessConfig::default(), &config).unwrap_err();
        assert!(matches!(err, OcrError::UnsupportedMediaType { .. }));
        assert_eq!(rec.calls(), 0);
    }

    #[test]
    fn path_follows_category() {
        let bytes = [1u8, 2, 3];
        let path = ExtractionPath::for_media_type("Application/PDF", &bytes).unwrap();
        assert!(matches!(path, ExtractionPath::MultiPageRaster(b) if b == &bytes[..]));
        assert_eq!(path.category(), Category::Pdf);
        assert_eq!(page_marker(12), "--- Page 12 ---");
    }

    #[test]
    fn input_image_is_untouched_by_preprocessing() {
        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(4, 4, Rgb([10, 20, 30])));
        let rec = ScriptedRecognizer::new(&["ok"]);
        let pre = PreprocessConfig {
            grayscale: true,
            brightness: 1.5,
            ..Default::default()
        };
        recognize_unit(rec.as_ref(), &img, &pre).unwrap();
        assert_eq!(img.get_pixel(0, 0).0, [10, 20, 30, 255]);
    }

    #[tokio::test]
    async fn async_extract_runs_on_blocking_pool() {
        let rec = ScriptedRecognizer::new(&["one", "two"]);
        let config = config_with(rec.clone(), FakeRasterizer::new(2));
        let doc = UploadedDocument::new(b"%PDF".to_vec(), "application/pdf", "two.pdf");

        let result = extract(&doc, &PreprocessConfig::default(), &config)
            .await
            .unwrap();
        assert_eq!(result.unit_count, 2);
        assert_eq!(rec.calls(), 2);
    }
}
