//! PDF rasterisation: render every page to a `DynamicImage` via pdfium.
//!
//! Pages come back in document order and are never filtered, so blank pages
//! still produce a (probably empty) recognition unit. The first page that
//! fails to render aborts the whole document.
//!
//! Rendering is CPU-bound and pdfium keeps thread-local state, so callers
//! run [`PageRasterizer::rasterize`] on the blocking pool (see
//! [`crate::extract::extract`]).

use crate::config::ExtractionConfig;
use crate::error::OcrError;
use image::DynamicImage;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Converts a multi-page document into one image per page.
pub trait PageRasterizer: Send + Sync {
    /// Render all pages of `document`, in page order.
    fn rasterize(&self, document: &[u8]) -> Result<Vec<DynamicImage>, OcrError>;
}

/// pdfium-backed rasteriser.
#[derive(Debug, Clone)]
pub struct PdfiumRasterizer {
    dpi: u32,
    max_pixels: u32,
    lib_path: Option<PathBuf>,
}

impl PdfiumRasterizer {
    pub fn new(dpi: u32, max_pixels: u32) -> Self {
        Self {
            dpi,
            max_pixels,
            lib_path: None,
        }
    }

    /// Load pdfium from `path` (a library file or the directory holding it).
    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.lib_path = Some(path.into());
        self
    }

    /// Render scale relative to pdfium's 72-points-per-inch page space.
    pub fn scale(&self) -> f32 {
        self.dpi as f32 / 72.0
    }

    fn bind(&self) -> Result<Pdfium, OcrError> {
        let explicit = self
            .lib_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => Pdfium::bind_to_library(&library_file(&path)),
            None => Pdfium::bind_to_system_library(),
        }
        .map_err(|e| OcrError::PdfiumBindingFailed(format!("{:?}", e)))?;

        Ok(Pdfium::new(bindings))
    }
}

/// Resolve a directory to the platform library name inside it.
fn library_file(path: &Path) -> PathBuf {
    if path.is_dir() {
        Pdfium::pdfium_platform_library_name_at_path(path)
    } else {
        path.to_path_buf()
    }
}

impl PageRasterizer for PdfiumRasterizer {
    fn rasterize(&self, document: &[u8]) -> Result<Vec<DynamicImage>, OcrError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_byte_slice(document, None)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.contains("Password") || err_str.contains("password") {
                    OcrError::CorruptPdf("document is encrypted and requires a password".into())
                } else {
                    OcrError::CorruptPdf(err_str)
                }
            })?;

        let pages = document.pages();
        let total_pages = pages.len() as usize;
        info!("PDF loaded: {} pages", total_pages);

        let render_config = PdfRenderConfig::new()
            .scale_page_by_factor(self.scale())
            .set_maximum_width(self.max_pixels as i32)
            .set_maximum_height(self.max_pixels as i32);

        let mut images = Vec::with_capacity(total_pages);
        for (idx, page) in pages.iter().enumerate() {
            let bitmap = page.render_with_config(&render_config).map_err(|e| {
                OcrError::RenderFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                }
            })?;

            let image = bitmap.as_image();
            debug!(
                "Rendered page {} → {}x{} px",
                idx + 1,
                image.width(),
                image.height()
            );
            images.push(image);
        }

        Ok(images)
    }
}

/// Return the configured rasteriser, or build a pdfium one from the settings.
pub fn resolve_rasterizer(config: &ExtractionConfig) -> Arc<dyn PageRasterizer> {
    if let Some(ref rasterizer) = config.rasterizer {
        return Arc::clone(rasterizer);
    }
    let mut rasterizer = PdfiumRasterizer::new(config.dpi, config.max_rendered_pixels);
    if let Some(ref path) = config.pdfium_lib_path {
        rasterizer = rasterizer.with_library_path(path.clone());
    }
    Arc::new(rasterizer)
}
