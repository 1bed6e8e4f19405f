// src/provider/mod.rs — Model provider layer

pub mod gemini_web;
pub mod google;
pub mod openai_compat;
pub mod registry;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::infra::errors::DraftError;

/// Core trait that all model providers implement.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    fn id(&self) -> &str;

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DraftError>;
}

/// One prompt in, one completion out. Every pipeline step is a single turn.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub prompt: String,
    pub temperature: Option<f32>,
}

impl ChatRequest {
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            prompt: prompt.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub content: String,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

/// Map a reqwest transport failure onto the provider error taxonomy.
pub(crate) fn transport_error(provider: &str, timeout_secs: u64, e: reqwest::Error) -> DraftError {
    if e.is_timeout() {
        DraftError::Timeout {
            provider: provider.to_string(),
            seconds: timeout_secs,
        }
    } else {
        DraftError::Provider {
            provider: provider.to_string(),
            message: e.to_string(),
        }
    }
}

/// Read a failed HTTP response into a provider error.
pub(crate) async fn status_error(provider: &str, response: reqwest::Response) -> DraftError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    DraftError::Provider {
        provider: provider.to_string(),
        message: format!("HTTP {}: {}", status, body),
    }
}
