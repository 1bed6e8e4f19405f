// src/provider/registry.rs — Known provider pipelines

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::infra::config::Config;
use crate::infra::errors::DraftError;

pub const GEMINI_KEY_VAR: &str = "GEMINI_API_KEY";
pub const ZHIPU_KEY_VAR: &str = "ZHIPU_API_KEY";
pub const DEEPSEEK_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const OPENAI_KEY_VAR: &str = "OPENAI_API_KEY";

/// Which backends drive a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Gemini,
    Zhipu,
    GeminiWeb,
    /// Gemini Web researches, scores and rewrites; DeepSeek writes the draft.
    GeminiDeepseek,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 4] = [
        ProviderKind::Gemini,
        ProviderKind::Zhipu,
        ProviderKind::GeminiWeb,
        ProviderKind::GeminiDeepseek,
    ];

    /// Identifier accepted by the CLI and the start endpoint.
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Zhipu => "zhipu",
            ProviderKind::GeminiWeb => "gemini-web",
            ProviderKind::GeminiDeepseek => "gemini-deepseek",
        }
    }

    /// Label shown on the dashboard and written to record headers.
    pub fn label(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "Gemini 3 Pro",
            ProviderKind::Zhipu => "Zhipu GLM-4.7",
            ProviderKind::GeminiWeb => "Gemini Web",
            ProviderKind::GeminiDeepseek => "Gemini Web + DeepSeek",
        }
    }

    /// Fragment used in record ids.
    pub fn slug(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "gemini",
            ProviderKind::Zhipu => "zhipu",
            ProviderKind::GeminiWeb => "gemini_web",
            ProviderKind::GeminiDeepseek => "gemini_deepseek",
        }
    }

    /// Environment variables that must be set before a run can start.
    pub fn required_env(self) -> &'static [&'static str] {
        match self {
            ProviderKind::Gemini => &[GEMINI_KEY_VAR],
            ProviderKind::Zhipu => &[ZHIPU_KEY_VAR],
            ProviderKind::GeminiWeb => &[],
            ProviderKind::GeminiDeepseek => &[DEEPSEEK_KEY_VAR],
        }
    }

    /// Iteration cap from the provider's config section.
    pub fn max_iterations(self, config: &Config) -> u32 {
        match self {
            ProviderKind::Gemini => config.providers.gemini.max_iterations,
            ProviderKind::Zhipu => config.providers.zhipu.max_iterations,
            ProviderKind::GeminiWeb | ProviderKind::GeminiDeepseek => {
                config.providers.gemini_web.max_iterations
            }
        }
    }

    /// Whether the Gemini-web client is involved, so its command must exist.
    pub fn uses_gemini_web(self) -> bool {
        matches!(self, ProviderKind::GeminiWeb | ProviderKind::GeminiDeepseek)
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = DraftError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('_', "-");
        ProviderKind::ALL
            .into_iter()
            .find(|k| k.id() == normalized)
            .ok_or_else(|| {
                let known: Vec<&str> = ProviderKind::ALL.iter().map(|k| k.id()).collect();
                DraftError::Config(format!(
                    "Unknown provider '{}'. Available: {}",
                    s,
                    known.join(", ")
                ))
            })
    }
}

/// Non-empty value of an environment variable.
pub fn env_key(var: &str) -> Option<String> {
    std::env::var(var)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Like [`env_key`], but a missing key is a configuration error.
pub fn require_key(var: &str) -> Result<String, DraftError> {
    env_key(var).ok_or_else(|| DraftError::MissingCredential {
        env_var: var.to_string(),
    })
}
