//! Text recognition: one image in, one string out.
//!
//! Recognition always uses the same engine configuration: fully automatic
//! page segmentation (`--psm 3`) with the default engine mode (`--oem 3`,
//! LSTM where trained data allows). Callers cannot change it per call.
//!
//! An image without text is a successful empty string. Everything that
//! prevents the engine from answering (binary missing, crash, bad language
//! pack) is an [`OcrError::Engine`].

use crate::config::ExtractionConfig;
use crate::error::OcrError;
use crate::pipeline::encode::encode_png;
use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tracing::{debug, warn};

/// Page segmentation mode: fully automatic, no orientation detection.
pub const PAGE_SEG_MODE: &str = "3";
/// Engine mode: default (LSTM when available).
pub const ENGINE_MODE: &str = "3";

/// A recognition engine.
///
/// Implementations are blocking and are called from the blocking thread
/// pool. They must be shareable across requests.
pub trait TextRecognizer: Send + Sync {
    /// Short engine name used in logs.
    fn name(&self) -> &str;

    /// Recognise the text in `image`. No text is `Ok("")`.
    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError>;
}

/// Drives the `tesseract` executable, streaming a PNG through stdin.
#[derive(Debug, Clone)]
pub struct TesseractCli {
    cmd: PathBuf,
    language: String,
}

impl TesseractCli {
    pub fn new(cmd: impl Into<PathBuf>, language: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            language: language.into(),
        }
    }

    /// Executable this recogniser will spawn.
    pub fn cmd(&self) -> &Path {
        &self.cmd
    }

    /// Arguments passed to tesseract; the image comes from stdin and the
    /// text goes to stdout.
    pub fn args(&self) -> Vec<String> {
        vec![
            "stdin".into(),
            "stdout".into(),
            "--oem".into(),
            ENGINE_MODE.into(),
            "--psm".into(),
            PAGE_SEG_MODE.into(),
            "-l".into(),
            self.language.clone(),
        ]
    }
}

impl TextRecognizer for TesseractCli {
    fn name(&self) -> &str {
        "tesseract-cli"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        let png = encode_png(image)?;

        let mut child = Command::new(&self.cmd)
            .args(self.args())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    OcrError::Engine(format!(
                        "tesseract executable '{}' not found; install tesseract-ocr or set TESSERACT_CMD",
                        self.cmd.display()
                    ))
                } else {
                    OcrError::Engine(format!("failed to start tesseract: {e}"))
                }
            })?;

        // Write stdin from a helper thread so a large page can't deadlock
        // against tesseract filling its stdout pipe.
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| OcrError::Internal("tesseract stdin was not captured".into()))?;
        let writer = std::thread::spawn(move || stdin.write_all(&png));

        let output = child
            .wait_with_output()
            .map_err(|e| OcrError::Engine(format!("tesseract did not finish: {e}")))?;

        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!("Failed writing image to tesseract stdin: {}", e),
            Err(_) => return Err(OcrError::Internal("tesseract stdin writer panicked".into())),
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(OcrError::Engine(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let text = String::from_utf8(output.stdout)
            .map_err(|e| OcrError::Engine(format!("tesseract produced invalid UTF-8: {e}")))?;
        debug!(
            "{} recognised {} chars from {}x{} image",
            self.name(),
            text.len(),
            image.width(),
            image.height()
        );
        Ok(text)
    }
}

/// In-process libtesseract binding with the same fixed configuration.
#[cfg(feature = "libtesseract")]
#[derive(Debug, Clone)]
pub struct TesseractLib {
    language: String,
}

#[cfg(feature = "libtesseract")]
impl TesseractLib {
    pub fn new(language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
        }
    }
}

#[cfg(feature = "libtesseract")]
impl TextRecognizer for TesseractLib {
    fn name(&self) -> &str {
        "libtesseract"
    }

    fn recognize(&self, image: &DynamicImage) -> Result<String, OcrError> {
        use tesseract::{OcrEngineMode, PageSegMode, Tesseract};

        let png = encode_png(image)?;

        // A handle is not Sync, so each call initialises its own.
        let mut tess = Tesseract::new_with_oem(None, Some(&self.language), OcrEngineMode::Default)
            .map_err(|e| OcrError::Engine(format!("tesseract init failed: {e}")))?
            .set_image_from_mem(&png)
            .map_err(|e| OcrError::Engine(format!("tesseract rejected image: {e}")))?;
        tess.set_page_seg_mode(PageSegMode::PsmAuto);

        tess.get_text()
            .map_err(|e| OcrError::Engine(format!("tesseract recognition failed: {e}")))
    }
}

/// Return the configured recogniser, or build the default one.
pub fn resolve_recognizer(config: &ExtractionConfig) -> Arc<dyn TextRecognizer> {
    if let Some(ref recognizer) = config.recognizer {
        return Arc::clone(recognizer);
    }

    #[cfg(feature = "libtesseract")]
    {
        Arc::new(TesseractLib::new(config.language.clone()))
    }

    #[cfg(not(feature = "libtesseract"))]
    {
        Arc::new(TesseractCli::new(config.tesseract_cmd.clone(), config.language.clone()))
    }
}
