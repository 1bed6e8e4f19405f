// src/cover/dalle.rs — Cover images from the OpenAI images API

use async_trait::async_trait;
use chrono::Local;
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::{CoverGenerator, CoverImage, CoverStyle};
use crate::infra::config::CoverConfig;
use crate::infra::errors::DraftError;
use crate::provider::{status_error, transport_error};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DOWNLOAD_TIMEOUT_SECS: u64 = 30;
const PROVIDER_ID: &str = "dalle";

const STOP_WORDS: &[&str] = &[
    "的", "了", "是", "在", "我", "你", "他", "她", "它", "我们", "他们", "这", "那", "有",
    "没有", "会", "能", "可以", "但是", "因为", "所以", "如果", "虽然", "然后", "还是", "或者",
    "和", "与", "及",
];

fn is_cjk(c: char) -> bool {
    ('\u{4e00}'..='\u{9fa5}').contains(&c)
}

/// Most frequent 2-4 character CJK chunks, ties in order of first appearance.
pub fn extract_keywords(content: &str, max_keywords: usize) -> Vec<String> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    let mut run: Vec<char> = Vec::new();
    let mut flush = |run: &mut Vec<char>| {
        for chunk in run.chunks(4).filter(|c| c.len() >= 2) {
            let word: String = chunk.iter().collect();
            if STOP_WORDS.contains(&word.as_str()) {
                continue;
            }
            let n = counts.entry(word.clone()).or_insert(0);
            if *n == 0 {
                order.push(word);
            }
            *n += 1;
        }
        run.clear();
    };

    for c in content.chars() {
        if is_cjk(c) {
            run.push(c);
        } else {
            flush(&mut run);
        }
    }
    flush(&mut run);

    // Stable sort keeps first-appearance order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));
    order.truncate(max_keywords);
    order
}

pub struct DalleCover {
    api_key: String,
    base_url: String,
    model: String,
    size: String,
    timeout_secs: u64,
    out_dir: PathBuf,
    client: reqwest::Client,
}

impl DalleCover {
    pub fn new(api_key: String, config: &CoverConfig, out_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: config.model.clone(),
            size: config.size.clone(),
            timeout_secs: config.timeout_seconds,
            out_dir: out_dir.into(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn build_prompt(title: &str, text: &str, style: CoverStyle) -> String {
        let keywords = extract_keywords(text, 10);
        let keywords: Vec<&str> = keywords.iter().take(5).map(String::as_str).collect();
        format!(
            "Create a cover image for an article titled \"{}\".\n\
             Style: {}\n\
             Keywords: {}\n\
             Format: Horizontal wide image (2.35:1 ratio), perfect for article cover.\n\
             Design: Clean, professional, suitable for Chinese social media.",
            title,
            style.image_prompt(),
            keywords.join(", ")
        )
    }

    async fn request_image_url(&self, prompt: &str) -> Result<String, DraftError> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "n": 1,
            "size": self.size,
            "response_format": "url",
        });

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .timeout(Duration::from_secs(self.timeout_secs))
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, self.timeout_secs, e))?;

        if !response.status().is_success() {
            return Err(status_error(PROVIDER_ID, response).await);
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, self.timeout_secs, e))?;

        resp["data"][0]["url"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| DraftError::Provider {
                provider: PROVIDER_ID.into(),
                message: "Response has no image url".into(),
            })
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, DraftError> {
        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, DOWNLOAD_TIMEOUT_SECS, e))?;
        if !response.status().is_success() {
            return Err(status_error(PROVIDER_ID, response).await);
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, DOWNLOAD_TIMEOUT_SECS, e))?;
        Ok(bytes.to_vec())
    }
}

#[async_trait]
impl CoverGenerator for DalleCover {
    fn method(&self) -> &str {
        PROVIDER_ID
    }

    async fn generate(
        &self,
        title: &str,
        text: &str,
        style: CoverStyle,
    ) -> Result<Option<CoverImage>, DraftError> {
        let prompt = Self::build_prompt(title, text, style);
        let url = self.request_image_url(&prompt).await?;
        let bytes = self.download(&url).await?;

        tokio::fs::create_dir_all(&self.out_dir).await?;
        let file_name = format!("cover_{}.png", Local::now().format("%Y%m%d_%H%M%S"));
        let path = self.out_dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        Ok(Some(CoverImage {
            file_name,
            path,
            method: self.method().to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_by_frequency() {
        let text = "自律，自律，自律。焦虑，焦虑。成长";
        assert_eq!(extract_keywords(text, 10), vec!["自律", "焦虑", "成长"]);
    }

    #[test]
    fn test_keywords_chunk_long_runs() {
        // 7 chars: one 4-char chunk and one 3-char chunk
        assert_eq!(extract_keywords("一二三四五六七", 10), vec!["一二三四", "五六七"]);
    }

    #[test]
    fn test_keywords_skip_single_and_stop_words() {
        assert!(extract_keywords("我 的 ai", 10).is_empty());
        assert!(extract_keywords("我们，他们", 10).is_empty());
    }

    #[test]
    fn test_keywords_limit() {
        let text = "甲乙，丙丁，戊己，庚辛";
        assert_eq!(extract_keywords(text, 2).len(), 2);
    }

    #[test]
    fn test_prompt_mentions_title_style_keywords() {
        let prompt = DalleCover::build_prompt("别再讨好了", "讨好，讨好，边界", CoverStyle::Warm);
        assert!(prompt.contains("\"别再讨好了\""));
        assert!(prompt.contains("warm colors"));
        assert!(prompt.contains("Keywords: 讨好, 边界"));
    }
}
