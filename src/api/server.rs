//! API server setup and configuration.

use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
};

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{error::OcrError, error::Result, ServerConfig};

use super::{
    handlers::{analyze_handler, health_handler, token_handler},
    types::ApiState,
};

/// Room above the upload ceiling for multipart framing and form fields.
///
/// The body limit is set this far above the configured ceiling so that an
/// oversized file still reaches the validation gate and gets a JSON 413.
///
/// Only `DefaultBodyLimit` is applied. It is enforced while the multipart
/// stream is read, which happens after the token check, so an unauthorised
/// request is refused with 403 whatever its size.
pub const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Create the API router with all routes configured.
///
/// This is public to allow users to embed the router in their own applications.
///
/// # Examples
///
/// ```no_run
/// use edgequake_ocr::{api::create_router, ServerConfig};
///
/// # fn main() -> edgequake_ocr::error::Result<()> {
/// let config = ServerConfig::builder().max_upload_bytes(10 * 1024 * 1024).build()?;
/// let router = create_router(config);
/// # Ok(())
/// # }
/// ```
pub fn create_router(config: ServerConfig) -> Router {
    let body_limit = config
        .max_upload_bytes
        .saturating_add(MULTIPART_OVERHEAD_BYTES);
    let cors_layer = cors_layer(&config.cors_origins);
    let expose_token = config.expose_token_endpoint;

    let state = ApiState {
        config: Arc::new(config),
    };

    let mut router = Router::new()
        .route("/analyze", post(analyze_handler))
        .route("/health", get(health_handler));

    if expose_token {
        tracing::warn!(
            "GET /api/token is enabled and discloses the access token. \
             Use it for local development only."
        );
        router = router.route("/api/token", get(token_handler));
    }

    router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let parsed: Vec<_> = origins
        .iter()
        .filter(|s| !s.trim().is_empty())
        .filter_map(|s| s.trim().parse::<axum::http::HeaderValue>().ok())
        .collect();

    if !parsed.is_empty() {
        tracing::info!("CORS configured with {} explicit allowed origin(s)", parsed.len());
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(parsed))
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        if !origins.is_empty() {
            tracing::warn!("CORS origins set but empty/invalid - falling back to permissive CORS");
        }
        tracing::warn!(
            "CORS configured to allow all origins. For production, set APP_CORS_ORIGINS \
             to a comma-separated list of allowed origins"
        );
        CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
    }
}

/// Start the API server.
///
/// # Arguments
///
/// * `host` - IP address to bind to (e.g., "127.0.0.1" or "0.0.0.0")
/// * `port` - Port number to bind to (e.g., 8000)
/// * `config` - Token, upload ceiling and extraction settings
pub async fn serve(host: impl AsRef<str>, port: u16, config: ServerConfig) -> Result<()> {
    let ip: IpAddr = host
        .as_ref()
        .parse()
        .map_err(|e| OcrError::InvalidConfig(format!("Invalid host address: {}", e)))?;

    let addr = SocketAddr::new(ip, port);
    tracing::info!(
        "Upload size limit: {} bytes, DPI {}, language '{}'",
        config.max_upload_bytes,
        config.extraction.dpi,
        config.extraction.language
    );
    let app = create_router(config);

    tracing::info!("Starting OCR API server on http://{}:{}", ip, port);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| OcrError::Internal(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .await
        .map_err(|e| OcrError::Internal(e.to_string()))?;

    Ok(())
}
