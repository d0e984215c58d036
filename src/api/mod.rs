//! HTTP API for document text extraction.
//!
//! An axum router exposing the extraction pipeline behind a shared-secret
//! token carried in the `X-Token` header.
//!
//! # Endpoints
//!
//! - `POST /analyze` - Extract text from one uploaded file (multipart form data)
//! - `GET /health` - Health check endpoint
//! - `GET /api/token` - Development only: disclose the token. Routed only
//!   when [`ServerConfig::expose_token_endpoint`](crate::ServerConfig) is set.
//!
//! # Examples
//!
//! ## Starting the server
//!
//! ```no_run
//! use edgequake_ocr::{api::serve, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> edgequake_ocr::error::Result<()> {
//!     let config = ServerConfig::builder().token("change-me").build()?;
//!     serve("127.0.0.1", 8000, config).await
//! }
//! ```
//!
//! ## Embedding the router in your app
//!
//! ```no_run
//! use edgequake_ocr::{api::create_router, ServerConfig};
//! use axum::Router;
//!
//! # fn main() -> edgequake_ocr::error::Result<()> {
//! let ocr_router = create_router(ServerConfig::builder().build()?);
//! let app: Router = Router::new().nest("/ocr", ocr_router);
//! # Ok(())
//! # }
//! ```
//!
//! # cURL Examples
//!
//! ```bash
//! # Plain extraction
//! curl -H "X-Token: $APP_API_TOKEN" -F "file=@scan.png" http://localhost:8000/analyze
//!
//! # With preprocessing
//! curl -H "X-Token: $APP_API_TOKEN" -F "file=@invoice.pdf" \
//!      -F grayscale=true -F denoise=true -F contrast=1.5 \
//!      http://localhost:8000/analyze
//!
//! # Health check
//! curl http://localhost:8000/health
//! ```

mod error;
mod handlers;
mod server;
mod types;

pub use error::ApiError;
pub use server::{create_router, serve};
pub use types::{
    AnalyzeData, AnalyzeResponse, ApiState, ErrorResponse, HealthResponse, Insights, TokenResponse,
};
