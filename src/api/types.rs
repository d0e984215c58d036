//! API request and response types.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{PreprocessConfig, ServerConfig};

/// Placeholder content reported when no text was found.
pub const NO_TEXT_PLACEHOLDER: &str = "No text could be identified.";

/// API server state.
///
/// Built once by [`create_router`](super::create_router) and shared by every
/// request; nothing in it is mutated after startup.
#[derive(Debug, Clone)]
pub struct ApiState {
    /// Token, upload ceiling and extraction settings.
    pub config: Arc<ServerConfig>,
}

/// Successful `POST /analyze` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    /// Always `"success"`.
    pub status: String,
    pub data: AnalyzeData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzeData {
    /// Extracted text, or [`NO_TEXT_PLACEHOLDER`].
    pub content: String,
    pub insights: Insights,
}

/// Metadata about one extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insights {
    /// Filename as uploaded.
    pub filename: String,
    /// Filename extension with leading dot, or empty.
    pub extension: String,
    /// Category label: `IMG`, `PDF` or `DOCX`.
    #[serde(rename = "type")]
    pub kind: String,
    pub word_count: usize,
    /// Seconds rounded to milliseconds, suffixed with `s`, e.g. `"0.042s"`.
    pub execution_time: String,
    /// Pages or images processed.
    pub page_count: usize,
    /// Preprocessing options as received.
    pub config_applied: PreprocessConfig,
}

/// `GET /api/token` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status
    pub status: String,
    /// API version
    pub version: String,
}

/// Error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub detail: String,
}
