//! Configuration types for document extraction and the HTTP service.
//!
//! Three layers, each built once and then only read:
//!
//! * [`PreprocessConfig`]: per-request pixel adjustments. A small `Copy`
//!   value built at the API boundary from form fields.
//! * [`ExtractionConfig`]: process-wide engine settings (render DPI, OCR
//!   language, injected engines). Built via [`ExtractionConfigBuilder`].
//! * [`ServerConfig`]: the access token, upload ceiling and endpoint
//!   switches for the API, wrapping an `ExtractionConfig`.

use crate::error::OcrError;
use crate::pipeline::recognize::TextRecognizer;
use crate::pipeline::render::PageRasterizer;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Default upload ceiling: 5 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

// ── Preprocessing ────────────────────────────────────────────────────────

/// Optional pixel adjustments applied before recognition.
///
/// Every field has a *neutral* value at which its step is skipped:
/// `false` for the flags, `1.0` for the factors.
///
/// ```rust
/// use edgequake_ocr::PreprocessConfig;
///
/// let cfg = PreprocessConfig { grayscale: true, contrast: 1.4, ..Default::default() };
/// assert!(!cfg.is_neutral());
/// assert!(PreprocessConfig::default().is_neutral());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PreprocessConfig {
    /// Convert to single-channel luminance.
    pub grayscale: bool,
    /// Apply a 3×3 median filter.
    pub denoise: bool,
    /// Brightness factor; >1.0 brightens, <1.0 darkens.
    pub brightness: f64,
    /// Contrast factor around the image's mean grey.
    pub contrast: f64,
    /// Sharpness factor against a smoothed copy. Not exposed over HTTP.
    #[serde(default = "neutral_factor", skip_serializing)]
    pub sharpness: f64,
}

fn neutral_factor() -> f64 {
    1.0
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            grayscale: false,
            denoise: false,
            brightness: 1.0,
            contrast: 1.0,
            sharpness: 1.0,
        }
    }
}

impl PreprocessConfig {
    /// True when every step would be skipped.
    pub fn is_neutral(&self) -> bool {
        !self.grayscale
            && !self.denoise
            && self.brightness == 1.0
            && self.contrast == 1.0
            && self.sharpness == 1.0
    }
}

// ── Extraction ───────────────────────────────────────────────────────────

/// Engine settings shared by every extraction.
///
/// Built via [`ExtractionConfig::builder()`] or [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use edgequake_ocr::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .dpi(300)
///     .language("eng+deu")
///     .build()
///     .unwrap();
/// assert_eq!(config.dpi, 300);
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Rendering DPI for PDF pages. Range: 72–600. Default: 200.
    ///
    /// 200 DPI keeps body text around 30 px high, which is where tesseract's
    /// LSTM engine is most accurate.
    pub dpi: u32,

    /// Maximum rendered page dimension in pixels. Default: 4000.
    ///
    /// Caps memory on oversized pages (posters, engineering drawings)
    /// independently of DPI.
    pub max_rendered_pixels: u32,

    /// Tesseract language string, e.g. `eng` or `eng+fra`. Default: `eng`.
    pub language: String,

    /// Path or name of the tesseract executable. Default: `tesseract`.
    pub tesseract_cmd: PathBuf,

    /// Explicit pdfium library path. When `None`, `PDFIUM_LIB_PATH` and then
    /// the system library are tried.
    pub pdfium_lib_path: Option<PathBuf>,

    /// Pre-built recogniser. When `None`, one is created from the settings above.
    pub recognizer: Option<Arc<dyn TextRecognizer>>,

    /// Pre-built rasteriser. When `None`, a pdfium rasteriser is created.
    pub rasterizer: Option<Arc<dyn PageRasterizer>>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            dpi: 200,
            max_rendered_pixels: 4000,
            language: "eng".to_string(),
            tesseract_cmd: PathBuf::from("tesseract"),
            pdfium_lib_path: None,
            recognizer: None,
            rasterizer: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("dpi", &self.dpi)
            .field("max_rendered_pixels", &self.max_rendered_pixels)
            .field("language", &self.language)
            .field("tesseract_cmd", &self.tesseract_cmd)
            .field("pdfium_lib_path", &self.pdfium_lib_path)
            .field(
                "recognizer",
                &self.recognizer.as_ref().map(|r| r.name().to_string()),
            )
            .field(
                "rasterizer",
                &self.rasterizer.as_ref().map(|_| "<dyn PageRasterizer>"),
            )
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn dpi(mut self, dpi: u32) -> Self {
        self.config.dpi = dpi;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn language(mut self, language: impl Into<String>) -> Self {
        self.config.language = language.into();
        self
    }

    pub fn tesseract_cmd(mut self, cmd: impl Into<PathBuf>) -> Self {
        self.config.tesseract_cmd = cmd.into();
        self
    }

    pub fn pdfium_lib_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_lib_path = Some(path.into());
        self
    }

    pub fn recognizer(mut self, recognizer: Arc<dyn TextRecognizer>) -> Self {
        self.config.recognizer = Some(recognizer);
        self
    }

    pub fn rasterizer(mut self, rasterizer: Arc<dyn PageRasterizer>) -> Self {
        self.config.rasterizer = Some(rasterizer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, OcrError> {
        let c = &self.config;
        if c.dpi < 72 || c.dpi > 600 {
            return Err(OcrError::InvalidConfig(format!("DPI must be 72–600, got {}", c.dpi)));
        }
        if c.language.trim().is_empty() {
            return Err(OcrError::InvalidConfig("OCR language must not be empty".into()));
        }
        Ok(self.config)
    }
}

// ── Server ───────────────────────────────────────────────────────────────

/// Settings for the HTTP API.
///
/// The access token is fixed for the lifetime of the process; handlers
/// receive it through the router state rather than a global.
#[derive(Clone)]
pub struct ServerConfig {
    /// Shared secret expected in the `X-Token` header.
    pub token: String,
    /// Largest accepted upload in bytes. Default: 5 MiB.
    pub max_upload_bytes: usize,
    /// Route `GET /api/token`, which discloses the token. Development only.
    pub expose_token_endpoint: bool,
    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,
    /// Engine settings used for every request.
    pub extraction: ExtractionConfig,
}

impl fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerConfig")
            .field("token", &"<redacted>")
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("expose_token_endpoint", &self.expose_token_endpoint)
            .field("cors_origins", &self.cors_origins)
            .field("extraction", &self.extraction)
            .finish()
    }
}

impl ServerConfig {
    /// Create a builder. Without an explicit token a random one is generated.
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder {
            token: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            expose_token_endpoint: false,
            cors_origins: Vec::new(),
            extraction: ExtractionConfig::default(),
        }
    }
}

/// Builder for [`ServerConfig`].
#[derive(Debug)]
pub struct ServerConfigBuilder {
    token: Option<String>,
    max_upload_bytes: usize,
    expose_token_endpoint: bool,
    cors_origins: Vec<String>,
    extraction: ExtractionConfig,
}

impl ServerConfigBuilder {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    pub fn expose_token_endpoint(mut self, v: bool) -> Self {
        self.expose_token_endpoint = v;
        self
    }

    pub fn cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    pub fn extraction(mut self, config: ExtractionConfig) -> Self {
        self.extraction = config;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ServerConfig, OcrError> {
        if self.max_upload_bytes == 0 {
            return Err(OcrError::InvalidConfig("Upload limit must be ≥ 1 byte".into()));
        }
        let token = match self.token {
            Some(t) if t.is_empty() => {
                return Err(OcrError::InvalidConfig("Access token must not be empty".into()))
            }
            Some(t) => t,
            None => generate_token(),
        };
        Ok(ServerConfig {
            token,
            max_upload_bytes: self.max_upload_bytes,
            expose_token_endpoint: self.expose_token_endpoint,
            cors_origins: self.cors_origins,
            extraction: self.extraction,
        })
    }
}

/// Generate a random access token: 32 bytes from the OS RNG, URL-safe base64.
pub fn generate_token() -> String {
    let mut buf = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    URL_SAFE_NO_PAD.encode(buf)
}
