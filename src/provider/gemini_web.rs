// src/provider/gemini_web.rs — Gemini web client driven as a subprocess
//
// The client is an external script that reads the prompt from a file and
// prints a JSON object (`{"text": ...}`) on stdout, possibly after log lines.

use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use super::{ChatRequest, ChatResponse, ModelProvider, TokenUsage};
use crate::infra::config::GeminiWebConfig;
use crate::infra::errors::DraftError;
use crate::util::truncate_str;

const PROVIDER_ID: &str = "gemini-web";

pub struct GeminiWebProvider {
    command: String,
    args: Vec<String>,
    workdir: Option<PathBuf>,
    timeout_secs: u64,
    scratch_dir: PathBuf,
}

impl GeminiWebProvider {
    /// `scratch_dir` holds the short-lived prompt files.
    pub fn new(config: &GeminiWebConfig, scratch_dir: PathBuf) -> Self {
        Self {
            command: config.command.clone(),
            args: config.args.clone(),
            workdir: config.workdir.as_ref().map(PathBuf::from),
            timeout_secs: config.timeout_seconds,
            scratch_dir,
        }
    }

    async fn invoke(&self, prompt_file: &PathBuf) -> Result<String, DraftError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args)
            .arg("--promptfiles")
            .arg(prompt_file)
            .arg("--json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &self.workdir {
            cmd.current_dir(dir);
        }

        let output = tokio::time::timeout(Duration::from_secs(self.timeout_secs), cmd.output())
            .await
            .map_err(|_| DraftError::Timeout {
                provider: PROVIDER_ID.into(),
                seconds: self.timeout_secs,
            })?
            .map_err(|e| DraftError::Provider {
                provider: PROVIDER_ID.into(),
                message: format!("Failed to launch '{}': {}", self.command, e),
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
            tracing::warn!(
                "gemini-web exited with {}: {}",
                output.status,
                truncate_str(detail, 500)
            );
            return Err(DraftError::Provider {
                provider: PROVIDER_ID.into(),
                message: format!("exited with {}: {}", output.status, truncate_str(detail, 500)),
            });
        }

        extract_json_text(&stdout)
    }
}

/// Pull the `text` field out of client stdout. Anything before the first `{`
/// is log noise.
pub fn extract_json_text(stdout: &str) -> Result<String, DraftError> {
    let output = stdout.trim();
    if output.is_empty() {
        return Err(DraftError::Provider {
            provider: PROVIDER_ID.into(),
            message: "Empty response".into(),
        });
    }

    let json = match output.find('{') {
        Some(start) => &output[start..],
        None => output,
    };
    let data: serde_json::Value = serde_json::from_str(json).map_err(|e| DraftError::Provider {
        provider: PROVIDER_ID.into(),
        message: format!("Unparseable output: {}", e),
    })?;

    let text = data["text"].as_str().unwrap_or("").to_string();
    if text.trim().is_empty() {
        return Err(DraftError::Provider {
            provider: PROVIDER_ID.into(),
            message: "Response has no text".into(),
        });
    }
    Ok(text)
}

#[async_trait]
impl ModelProvider for GeminiWebProvider {
    fn id(&self) -> &str {
        PROVIDER_ID
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DraftError> {
        let prompt = request.prompt;
        tracing::debug!("Calling gemini-web with prompt length {}", prompt.chars().count());

        tokio::fs::create_dir_all(&self.scratch_dir).await?;
        let prompt_file = self
            .scratch_dir
            .join(format!("gemini_prompt_{}.txt", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&prompt_file, &prompt).await?;

        let result = self.invoke(&prompt_file).await;

        if let Err(e) = tokio::fs::remove_file(&prompt_file).await {
            tracing::debug!("Could not remove {}: {}", prompt_file.display(), e);
        }

        Ok(ChatResponse {
            content: result?,
            usage: TokenUsage::default(),
        })
    }
}
