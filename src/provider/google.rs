// src/provider/google.rs — Google Generative AI (Gemini) provider

use async_trait::async_trait;
use std::time::Duration;

use super::{status_error, transport_error, ChatRequest, ChatResponse, ModelProvider, TokenUsage};
use crate::infra::errors::DraftError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GoogleProvider {
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string(), 120)
    }

    pub fn with_base_url(api_key: String, base_url: String, timeout_secs: u64) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    /// Single user turn, plus generation settings when any are set.
    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": request.prompt }],
            }],
        });
        if let Some(temp) = request.temperature {
            body["generationConfig"] = serde_json::json!({ "temperature": temp });
        }
        body
    }

    /// Model ids may be configured with or without the `models/` prefix.
    fn model_path(model: &str) -> String {
        if model.starts_with("models/") {
            model.to_string()
        } else {
            format!("models/{}", model)
        }
    }
}

/// Concatenate the text parts of the first candidate.
fn extract_text(resp: &serde_json::Value) -> String {
    resp["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn id(&self) -> &str {
        "google"
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DraftError> {
        let body = self.build_request_body(&request);

        let url = format!(
            "{}/{}:generateContent",
            self.base_url,
            Self::model_path(&request.model),
        );

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error("google", self.timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(status_error("google", response).await);
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error("google", self.timeout_secs, e))?;

        let content = extract_text(&resp);
        if content.trim().is_empty() {
            let reason = resp["candidates"][0]["finishReason"]
                .as_str()
                .or_else(|| resp["promptFeedback"]["blockReason"].as_str())
                .unwrap_or("empty response");
            return Err(DraftError::Provider {
                provider: "google".into(),
                message: format!("No text in response ({})", reason),
            });
        }

        let usage = TokenUsage {
            input_tokens: resp["usageMetadata"]["promptTokenCount"]
                .as_u64()
                .unwrap_or(0) as u32,
            output_tokens: resp["usageMetadata"]["candidatesTokenCount"]
                .as_u64()
                .unwrap_or(0) as u32,
        };

        Ok(ChatResponse { content, usage })
    }
}
