// src/provider/openai_compat.rs — Generic OpenAI-compatible provider
//
// Used by: Zhipu GLM and DeepSeek.

use async_trait::async_trait;
use std::time::Duration;

use super::{status_error, transport_error, ChatRequest, ChatResponse, ModelProvider, TokenUsage};
use crate::infra::errors::DraftError;

/// Provider for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAICompatProvider {
    id_str: String,
    api_key: String,
    base_url: String,
    timeout_secs: u64,
    client: reqwest::Client,
}

impl OpenAICompatProvider {
    pub fn new(
        id: impl Into<String>,
        api_key: String,
        base_url: String,
        timeout_secs: u64,
    ) -> Self {
        Self {
            id_str: id.into(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs,
            client: reqwest::Client::new(),
        }
    }

    fn build_request_body(&self, request: &ChatRequest) -> serde_json::Value {
        let mut body = serde_json::json!({
            "model": request.model,
            "messages": [{ "role": "user", "content": request.prompt }],
        });
        if let Some(temp) = request.temperature {
            body["temperature"] = serde_json::json!(temp);
        }
        body
    }
}

#[async_trait]
impl ModelProvider for OpenAICompatProvider {
    fn id(&self) -> &str {
        &self.id_str
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DraftError> {
        let body = self.build_request_body(&request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&self.id_str, self.timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(status_error(&self.id_str, response).await);
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error(&self.id_str, self.timeout_secs, e))?;

        let content = resp["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or("")
            .to_string();
        if content.trim().is_empty() {
            return Err(DraftError::Provider {
                provider: self.id_str.clone(),
                message: "Empty completion".into(),
            });
        }

        let usage = TokenUsage {
            input_tokens: resp["usage"]["prompt_tokens"].as_u64().unwrap_or(0) as u32,
            output_tokens: resp["usage"]["completion_tokens"].as_u64().unwrap_or(0) as u32,
        };

        Ok(ChatResponse { content, usage })
    }
}
