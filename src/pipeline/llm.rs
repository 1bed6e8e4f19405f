// src/pipeline/llm.rs — Capabilities backed by a chat model

use async_trait::async_trait;
use std::sync::Arc;

use super::prompts::PromptSet;
use super::{Generator, Rewriter, Scorer, Topic};
use crate::core::extract::{parse_score, DEFAULT_SCORE};
use crate::infra::errors::DraftError;
use crate::provider::{ChatRequest, ModelProvider};

/// A provider bound to one model and sampling setup.
#[derive(Clone)]
pub struct ModelHandle {
    pub provider: Arc<dyn ModelProvider>,
    pub model: String,
    pub temperature: Option<f32>,
}

impl ModelHandle {
    pub fn new(provider: Arc<dyn ModelProvider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub async fn ask(&self, prompt: String) -> Result<String, DraftError> {
        let request = ChatRequest::prompt(&self.model, prompt).with_temperature(self.temperature);
        let response = self.provider.chat(request).await?;
        tracing::debug!(
            provider = self.provider.id(),
            model = %self.model,
            tokens = response.usage.total(),
            "chat completed"
        );
        Ok(response.content.trim().to_string())
    }
}

/// Topic and draft generation, possibly split across two models.
pub struct LlmGenerator {
    topic_model: ModelHandle,
    draft_model: ModelHandle,
    prompts: Arc<PromptSet>,
    domain_fallback: bool,
}

impl LlmGenerator {
    pub fn new(model: ModelHandle, prompts: Arc<PromptSet>) -> Self {
        Self {
            topic_model: model.clone(),
            draft_model: model,
            prompts,
            domain_fallback: false,
        }
    }

    /// Research the topic with one model and write with another.
    pub fn split(topic_model: ModelHandle, draft_model: ModelHandle, prompts: Arc<PromptSet>) -> Self {
        Self {
            topic_model,
            draft_model,
            prompts,
            domain_fallback: false,
        }
    }

    /// Use the domain itself as the title when the topic reply has none.
    pub fn with_domain_fallback(mut self) -> Self {
        self.domain_fallback = true;
        self
    }
}

#[async_trait]
impl Generator for LlmGenerator {
    async fn propose_topic(&self, domain: &str) -> Result<Topic, DraftError> {
        let reply = self.topic_model.ask(self.prompts.topic(domain)?).await?;
        Ok(Topic::parse(&reply))
    }

    async fn write_draft(&self, title: &str, outline: &str) -> Result<String, DraftError> {
        self.draft_model.ask(self.prompts.draft(title, outline)?).await
    }

    fn fallback_title(&self, domain: &str) -> String {
        if self.domain_fallback && !domain.trim().is_empty() {
            domain.trim().to_string()
        } else {
            crate::core::extract::FALLBACK_TITLE.to_string()
        }
    }
}

pub struct LlmScorer {
    model: ModelHandle,
    prompts: Arc<PromptSet>,
}

impl LlmScorer {
    pub fn new(model: ModelHandle, prompts: Arc<PromptSet>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Scorer for LlmScorer {
    async fn score(&self, text: &str) -> Result<u8, DraftError> {
        let reply = self.model.ask(self.prompts.score(text)?).await?;
        Ok(parse_score(&reply).unwrap_or_else(|| {
            tracing::warn!(
                "No number in score reply {:?}, assuming {}",
                crate::util::preview(&reply, 40),
                DEFAULT_SCORE
            );
            DEFAULT_SCORE
        }))
    }
}

pub struct LlmRewriter {
    model: ModelHandle,
    prompts: Arc<PromptSet>,
}

impl LlmRewriter {
    pub fn new(model: ModelHandle, prompts: Arc<PromptSet>) -> Self {
        Self { model, prompts }
    }
}

#[async_trait]
impl Rewriter for LlmRewriter {
    async fn humanize(&self, text: &str, current_score: u8) -> Result<String, DraftError> {
        self.model
            .ask(self.prompts.rewrite(text, Some(current_score))?)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{ChatResponse, TokenUsage};
    use std::sync::Mutex;

    /// Replies with canned text and records every prompt it sees.
    struct Canned {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl Canned {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.into(),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl ModelProvider for Canned {
        fn id(&self) -> &str {
            "canned"
        }
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse, DraftError> {
            self.seen.lock().unwrap().push(request);
            Ok(ChatResponse {
                content: self.reply.clone(),
                usage: TokenUsage::default(),
            })
        }
    }

    fn handle(p: Arc<Canned>) -> ModelHandle {
        ModelHandle::new(p, "m")
    }

    #[tokio::test]
    async fn test_generator_parses_topic() {
        let p = Canned::new("  标题：《别再讨好了》\n大纲：一、开头  ");
        let g = LlmGenerator::new(handle(p.clone()), Arc::new(PromptSet::default()));
        let topic = g.propose_topic("情感").await.unwrap();
        assert_eq!(topic.title.as_deref(), Some("别再讨好了"));
        assert_eq!(topic.outline, "一、开头");
        assert!(p.seen.lock().unwrap()[0].prompt.contains("情感"));
    }

    #[tokio::test]
    async fn test_split_generator_uses_draft_model() {
        let topic = Canned::new("标题：《T》");
        let draft = Canned::new("正文");
        let g = LlmGenerator::split(
            handle(topic.clone()),
            ModelHandle::new(draft.clone(), "deepseek-chat").with_temperature(0.7),
            Arc::new(PromptSet::research()),
        );
        assert_eq!(g.write_draft("T", "一、开头").await.unwrap(), "正文");
        assert!(topic.seen.lock().unwrap().is_empty());
        let seen = draft.seen.lock().unwrap();
        assert_eq!(seen[0].model, "deepseek-chat");
        assert_eq!(seen[0].temperature, Some(0.7));
    }

    #[test]
    fn test_fallback_title() {
        let prompts = Arc::new(PromptSet::default());
        let g = LlmGenerator::new(handle(Canned::new("")), prompts.clone());
        assert_eq!(g.fallback_title("职场"), "AI时代的思考");

        let g = LlmGenerator::new(handle(Canned::new("")), prompts).with_domain_fallback();
        assert_eq!(g.fallback_title("职场"), "职场");
        assert_eq!(g.fallback_title("  "), "AI时代的思考");
    }

    #[tokio::test]
    async fn test_scorer_parses_and_clamps() {
        let prompts = Arc::new(PromptSet::default());
        let s = LlmScorer::new(handle(Canned::new("AI 浓度：35")), prompts.clone());
        assert_eq!(s.score("text").await.unwrap(), 35);

        let s = LlmScorer::new(handle(Canned::new("150")), prompts.clone());
        assert_eq!(s.score("text").await.unwrap(), 100);

        let s = LlmScorer::new(handle(Canned::new("no idea")), prompts);
        assert_eq!(s.score("text").await.unwrap(), DEFAULT_SCORE);
    }

    #[tokio::test]
    async fn test_rewriter_passes_text() {
        let p = Canned::new("改写后");
        let r = LlmRewriter::new(handle(p.clone()), Arc::new(PromptSet::default()));
        assert_eq!(r.humanize("原文内容", 70).await.unwrap(), "改写后");
        let seen = p.seen.lock().unwrap();
        assert!(seen[0].prompt.contains("原文内容"));
        assert!(seen[0].prompt.contains("70%"));
    }
}
