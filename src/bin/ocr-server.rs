//! CLI binary for edgequake-ocr.
//!
//! A thin shim over the library crate: `serve` maps flags to a
//! `ServerConfig` and runs the HTTP API, `extract` runs the same pipeline
//! on a local file and prints the text.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use edgequake_ocr::{
    api, extract, validate_upload, ExtractionConfig, PreprocessConfig, ServerConfig,
    UploadedDocument,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Start the API with a fixed token
  APP_API_TOKEN=s3cret ocr-server serve --port 8000

  # Call it
  curl -H "X-Token: s3cret" -F "file=@scan.png" -F grayscale=true \
       http://127.0.0.1:8000/analyze

  # Extract a local file without the server
  ocr-server extract invoice.pdf

  # Preprocess and print JSON
  ocr-server extract --grayscale --contrast 1.5 --json receipt.jpg

ENVIRONMENT VARIABLES:
  APP_API_TOKEN           Access token expected in the X-Token header (random if unset)
  APP_HOST / APP_PORT     Bind address (default 127.0.0.1:8000)
  APP_MAX_UPLOAD_BYTES    Upload ceiling in bytes (default 5242880)
  APP_EXPOSE_TOKEN        Route GET /api/token (development only)
  APP_CORS_ORIGINS        Comma-separated allowed origins (default: any)
  OCR_DPI                 PDF rendering DPI (default 200)
  OCR_LANGUAGE            Tesseract language(s), e.g. eng or eng+deu
  TESSERACT_CMD           tesseract executable (default: tesseract on PATH)
  PDFIUM_LIB_PATH         Path to libpdfium (default: system library)
  RUST_LOG                Log filter, overrides --verbose
"#;

/// Extract text from images, PDFs and Word documents with tesseract.
#[derive(Parser, Debug)]
#[command(
    name = "ocr-server",
    version,
    about = "OCR document service: HTTP API and local extraction",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "OCR_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "OCR_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve(ServeArgs),
    /// Extract text from a local file.
    Extract(ExtractArgs),
}

/// Engine settings shared by both subcommands.
#[derive(Args, Debug)]
struct EngineArgs {
    /// PDF rendering DPI (72–600).
    #[arg(long, env = "OCR_DPI", default_value_t = 200,
          value_parser = clap::value_parser!(u32).range(72..=600))]
    dpi: u32,

    /// Longest rendered page edge in pixels.
    #[arg(long, env = "OCR_MAX_PIXELS", default_value_t = 4000)]
    max_pixels: u32,

    /// Tesseract language(s), e.g. `eng` or `eng+fra`.
    #[arg(short, long, env = "OCR_LANGUAGE", default_value = "eng")]
    language: String,

    /// tesseract executable.
    #[arg(long, env = "TESSERACT_CMD", default_value = "tesseract")]
    tesseract_cmd: PathBuf,

    /// Path to the pdfium library file or its directory.
    #[arg(long, env = "PDFIUM_LIB_PATH")]
    pdfium_lib_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to bind.
    #[arg(long, env = "APP_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to bind.
    #[arg(short, long, env = "APP_PORT", default_value_t = 8000)]
    port: u16,

    /// Access token expected in the X-Token header. Random when unset.
    #[arg(long, env = "APP_API_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Largest accepted upload in bytes.
    #[arg(long, env = "APP_MAX_UPLOAD_BYTES",
          default_value_t = edgequake_ocr::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Route GET /api/token, which discloses the token. Development only.
    #[arg(long, env = "APP_EXPOSE_TOKEN")]
    dev_token_endpoint: bool,

    /// Allowed CORS origins (comma separated). Any origin when empty.
    #[arg(long, env = "APP_CORS_ORIGINS", value_delimiter = ',')]
    cors_origins: Vec<String>,

    #[command(flatten)]
    engine: EngineArgs,
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// File to extract.
    file: PathBuf,

    /// Declared media type. Guessed from the extension when omitted.
    #[arg(long)]
    media_type: Option<String>,

    /// Convert to grayscale before recognition.
    #[arg(long)]
    grayscale: bool,

    /// Apply a 3×3 median filter before recognition.
    #[arg(long)]
    denoise: bool,

    /// Brightness factor (1.0 = unchanged).
    #[arg(long, default_value_t = 1.0)]
    brightness: f64,

    /// Contrast factor (1.0 = unchanged).
    #[arg(long, default_value_t = 1.0)]
    contrast: f64,

    /// Sharpness factor (1.0 = unchanged).
    #[arg(long, default_value_t = 1.0)]
    sharpness: f64,

    /// Largest accepted file in bytes.
    #[arg(long, env = "APP_MAX_UPLOAD_BYTES",
          default_value_t = edgequake_ocr::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload_bytes: usize,

    /// Print a JSON object instead of plain text.
    #[arg(long)]
    json: bool,

    #[command(flatten)]
    engine: EngineArgs,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve(args) => run_serve(args, cli.quiet).await,
        Command::Extract(args) => run_extract(args, cli.quiet).await,
    }
}

async fn run_serve(args: ServeArgs, quiet: bool) -> Result<()> {
    let token_from_env = args.token.is_some();

    let mut builder = ServerConfig::builder()
        .max_upload_bytes(args.max_upload_bytes)
        .expose_token_endpoint(args.dev_token_endpoint)
        .cors_origins(args.cors_origins)
        .extraction(build_extraction_config(&args.engine)?);
    if let Some(token) = args.token {
        builder = builder.token(token);
    }
    let config = builder.build().context("Invalid server configuration")?;

    if token_from_env {
        tracing::info!("Access token loaded from APP_API_TOKEN / --token");
    } else if !quiet {
        eprintln!(
            "{} Access token required in header 'X-Token': {}",
            bold("◆"),
            config.token
        );
    }

    api::serve(&args.host, args.port, config)
        .await
        .context("Server failed")
}

async fn run_extract(args: ExtractArgs, quiet: bool) -> Result<()> {
    let start = Instant::now();

    let media_type = match args.media_type {
        Some(ref m) => m.clone(),
        None => match mime_guess::from_path(&args.file).first() {
            Some(m) => m.essence_str().to_string(),
            None => bail!(
                "Cannot guess the media type of {:?}; pass --media-type",
                args.file
            ),
        },
    };

    let bytes = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("Failed to read {:?}", args.file))?;
    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let document = UploadedDocument::new(bytes, media_type, filename);

    validate_upload(&document.media_type, document.len(), args.max_upload_bytes)
        .context("File rejected")?;

    let preprocess_config = PreprocessConfig {
        grayscale: args.grayscale,
        denoise: args.denoise,
        brightness: args.brightness,
        contrast: args.contrast,
        sharpness: args.sharpness,
    };
    let config = build_extraction_config(&args.engine)?;

    let result = extract(&document, &preprocess_config, &config)
        .await
        .context("Extraction failed")?;

    if args.json {
        let json = serde_json::json!({
            "filename": &document.filename,
            "extension": document.extension(),
            "type": result.category,
            "page_count": result.unit_count,
            "word_count": result.word_count(),
            "content": &result.text,
        });
        println!(
            "{}",
            serde_json::to_string_pretty(&json).context("Failed to serialise output")?
        );
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(result.text.as_bytes())
            .context("Failed to write to stdout")?;
        if !result.text.ends_with('\n') {
            handle.write_all(b"\n").ok();
        }
    }

    if !quiet && !args.json {
        eprintln!(
            "{}  {} {}  {}",
            green("✔"),
            result.unit_count,
            if result.unit_count == 1 { "unit" } else { "units" },
            dim(&format!(
                "{} words, {}ms",
                result.word_count(),
                start.elapsed().as_millis()
            )),
        );
    }

    Ok(())
}

/// Map engine flags to `ExtractionConfig`.
fn build_extraction_config(args: &EngineArgs) -> Result<ExtractionConfig> {
    let mut builder = ExtractionConfig::builder()
        .dpi(args.dpi)
        .max_rendered_pixels(args.max_pixels)
        .language(args.language.clone())
        .tesseract_cmd(args.tesseract_cmd.clone());
    if let Some(ref path) = args.pdfium_lib_path {
        builder = builder.pdfium_lib_path(path.clone());
    }
    builder.build().context("Invalid engine configuration")
}
