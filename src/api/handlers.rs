//! API request handlers.

use std::time::{Duration, Instant};

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use bytes::Bytes;
use subtle::ConstantTimeEq;

use crate::{extract, validate_upload, PreprocessConfig, UploadedDocument};

use super::{
    error::ApiError,
    types::{
        AnalyzeData, AnalyzeResponse, ApiState, HealthResponse, Insights, TokenResponse,
        NO_TEXT_PLACEHOLDER,
    },
};

/// Header carrying the shared secret.
pub const TOKEN_HEADER: &str = "x-token";

/// Extract endpoint handler.
///
/// POST /analyze
///
/// Accepts multipart form data with:
/// - `file`: the document (its part `Content-Type` is the declared media type)
/// - `grayscale`, `denoise` (optional): booleans, default `false`
/// - `brightness`, `contrast` (optional): floats, default `1.0`
///
/// The token is checked before the body is read, so an unauthenticated
/// upload never reaches the pipeline.
pub async fn analyze_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let start = Instant::now();

    authenticate(&headers, &state.config.token)?;

    let mut multipart = multipart.map_err(|e| ApiError::invalid_request(e.body_text()))?;
    let (document, preprocess_config) =
        read_form(&mut multipart, state.config.max_upload_bytes).await?;

    tracing::info!(
        "Analyze '{}' ({}, {} bytes)",
        document.filename,
        document.media_type,
        document.len()
    );

    validate_upload(
        &document.media_type,
        document.len(),
        state.config.max_upload_bytes,
    )?;

    let result = extract(&document, &preprocess_config, &state.config.extraction).await?;
    let execution_time = format_execution_time(start.elapsed());

    let word_count = result.word_count();
    let content = if result.text.is_empty() {
        NO_TEXT_PLACEHOLDER.to_string()
    } else {
        result.text
    };

    Ok(Json(AnalyzeResponse {
        status: "success".to_string(),
        data: AnalyzeData {
            content,
            insights: Insights {
                extension: document.extension(),
                filename: document.filename,
                kind: result.category.label().to_string(),
                word_count,
                execution_time,
                page_count: result.unit_count,
                config_applied: preprocess_config,
            },
        },
    }))
}

/// Token endpoint handler.
///
/// GET /api/token
///
/// Development only: anyone who can reach this route can read the secret.
pub async fn token_handler(State(state): State<ApiState>) -> Json<TokenResponse> {
    tracing::warn!("API token disclosed via /api/token");
    Json(TokenResponse {
        token: state.config.token.clone(),
    })
}

/// Health check endpoint handler.
///
/// GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ── Internal helpers ─────────────────────────────────────────────────────

fn authenticate(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    let supplied = headers
        .get(TOKEN_HEADER)
        .map(|v| v.as_bytes())
        .unwrap_or_default();
    if bool::from(supplied.ct_eq(expected.as_bytes())) {
        Ok(())
    } else {
        Err(ApiError::AuthenticationFailed)
    }
}

async fn read_form(
    multipart: &mut Multipart,
    limit: usize,
) -> Result<(UploadedDocument, PreprocessConfig), ApiError> {
    let mut file: Option<(Bytes, String, String)> = None;
    let mut config = PreprocessConfig::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e.status(), e.body_text(), limit))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let media_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e.status(), e.body_text(), limit))?;
                file = Some((data, media_type, filename));
            }
            "grayscale" | "denoise" | "brightness" | "contrast" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e.status(), e.body_text(), limit))?;
                match field_name.as_str() {
                    "grayscale" => config.grayscale = parse_bool(&field_name, &value)?,
                    "denoise" => config.denoise = parse_bool(&field_name, &value)?,
                    "brightness" => config.brightness = parse_factor(&field_name, &value)?,
                    _ => config.contrast = parse_factor(&field_name, &value)?,
                }
            }
            _ => {}
        }
    }

    let (data, media_type, filename) =
        file.ok_or_else(|| ApiError::invalid_request("Missing required form part 'file'"))?;
    Ok((UploadedDocument::new(data, media_type, filename), config))
}

fn multipart_error(status: StatusCode, text: String, limit: usize) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BodyLimitExceeded { limit }
    } else {
        ApiError::invalid_request(text)
    }
}

/// Parse a form boolean the way HTML forms and curl users send them.
pub(crate) fn parse_bool(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ApiError::invalid_request(format!(
            "Field '{name}' must be a boolean, got '{value}'"
        ))),
    }
}

pub(crate) fn parse_factor(name: &str, value: &str) -> Result<f64, ApiError> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            ApiError::invalid_request(format!("Field '{name}' must be a number, got '{value}'"))
        })
}

/// Seconds rounded to three decimals with an `s` suffix: `0.042s`, `2.0s`.
pub(crate) fn format_execution_time(elapsed: Duration) -> String {
    let secs = (elapsed.as_secs_f64() * 1000.0).round() / 1000.0;
    if secs.fract() == 0.0 {
        format!("{secs:.1}s")
    } else {
        format!("{secs}s")
    }
}
