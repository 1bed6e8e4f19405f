// src/api/types.rs

use serde::{Deserialize, Serialize};

use crate::infra::config::{CoverConfig, PipelineConfig, PromptsConfig};
use crate::provider::registry::ProviderKind;

/// Request body for starting a run.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StartBody {
    /// Provider id; defaults to `[pipeline] default_provider`.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub target_score: Option<u8>,
}

#[derive(Debug, Serialize)]
pub struct StartedResponse {
    pub success: bool,
    pub run_id: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct HistoryQuery {
    pub page: Option<usize>,
    pub per_page: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ArticleResponse {
    pub success: bool,
    pub id: String,
    pub title: String,
    pub score: Option<u8>,
    pub provider: Option<String>,
    pub time: Option<String>,
    /// URL of the cover, when the record has one.
    pub cover: Option<String>,
    pub body: String,
    /// Full record text, header included.
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ProviderInfo {
    pub id: &'static str,
    pub label: &'static str,
    pub max_iterations: u32,
    /// Environment variables still unset for this provider.
    pub missing: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub success: bool,
    pub pipeline: PipelineConfig,
    /// Effective templates, built-in defaults filled in.
    pub prompts: PromptsConfig,
    pub cover: CoverConfig,
    pub providers: Vec<ProviderInfo>,
}

/// Partial config update; absent sections are left alone.
#[derive(Debug, Default, Deserialize)]
pub struct ConfigUpdate {
    #[serde(default)]
    pub pipeline: Option<PipelineConfig>,
    #[serde(default)]
    pub prompts: Option<PromptsConfig>,
    #[serde(default)]
    pub cover: Option<CoverConfig>,
}

/// Either a stored record id or inline title and markdown.
#[derive(Debug, Default, Deserialize)]
pub struct UploadBody {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub media_id: String,
    pub with_cover: bool,
}

#[derive(Debug, Serialize)]
pub struct WeChatCheck {
    pub success: bool,
    pub app_id: Option<String>,
    pub app_secret_set: bool,
    /// Token prefix, when one was obtained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errcode: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            errcode: None,
            hint: None,
        }
    }
}

impl ProviderInfo {
    pub fn of(kind: ProviderKind, max_iterations: u32) -> Self {
        Self {
            id: kind.id(),
            label: kind.label(),
            max_iterations,
            missing: kind
                .required_env()
                .iter()
                .copied()
                .filter(|var| crate::provider::registry::env_key(var).is_none())
                .collect(),
        }
    }
}
