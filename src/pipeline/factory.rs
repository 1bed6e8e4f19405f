// src/pipeline/factory.rs — Assemble a pipeline for a provider kind

use std::path::PathBuf;
use std::sync::Arc;

use super::llm::{LlmGenerator, LlmRewriter, LlmScorer, ModelHandle};
use super::prompts::PromptSet;
use super::{Generator, Rewriter, Scorer};
use crate::cover::{CoverChain, CoverGenerator, StylePreference};
use crate::infra::config::{Config, SharedConfig};
use crate::infra::errors::DraftError;
use crate::infra::paths;
use crate::provider::gemini_web::GeminiWebProvider;
use crate::provider::google::GoogleProvider;
use crate::provider::openai_compat::OpenAICompatProvider;
use crate::provider::registry::{
    env_key, require_key, ProviderKind, DEEPSEEK_KEY_VAR, GEMINI_KEY_VAR, OPENAI_KEY_VAR,
    ZHIPU_KEY_VAR,
};
use crate::provider::ModelProvider;

/// Everything one run needs besides the article sink.
pub struct Pipeline {
    pub kind: ProviderKind,
    pub generator: Arc<dyn Generator>,
    pub scorer: Arc<dyn Scorer>,
    pub rewriter: Arc<dyn Rewriter>,
    pub cover: Option<(Arc<dyn CoverGenerator>, StylePreference)>,
    pub max_iterations: u32,
}

impl Pipeline {
    /// One model for every capability.
    pub fn single(kind: ProviderKind, model: ModelHandle, prompts: Arc<PromptSet>) -> Self {
        Self {
            kind,
            generator: Arc::new(LlmGenerator::new(model.clone(), prompts.clone())),
            scorer: Arc::new(LlmScorer::new(model.clone(), prompts.clone())),
            rewriter: Arc::new(LlmRewriter::new(model, prompts)),
            cover: None,
            max_iterations: 2,
        }
    }
}

pub trait PipelineFactory: Send + Sync {
    /// Fails with a configuration error before any external call is made.
    fn build(&self, kind: ProviderKind) -> Result<Pipeline, DraftError>;
}

/// Builds pipelines from the current config and API keys in the environment.
pub struct ConfigPipelineFactory {
    config: SharedConfig,
    scratch_dir: PathBuf,
}

impl ConfigPipelineFactory {
    pub fn new(config: SharedConfig) -> Self {
        Self {
            config,
            scratch_dir: paths::cache_dir(),
        }
    }

    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = dir.into();
        self
    }

    fn gemini_web(&self, config: &Config) -> ModelHandle {
        let provider: Arc<dyn ModelProvider> = Arc::new(GeminiWebProvider::new(
            &config.providers.gemini_web,
            self.scratch_dir.clone(),
        ));
        ModelHandle::new(provider, "gemini-web")
    }
}

fn build_prompts(config: &Config, base: PromptSet) -> Result<Arc<PromptSet>, DraftError> {
    let set = base
        .with_lengths(
            config.pipeline.article_length,
            config.pipeline.score_sample_chars,
        )
        .with_overrides(&config.prompts)?;
    Ok(Arc::new(set))
}

fn build_cover(config: &Config) -> Result<Option<(Arc<dyn CoverGenerator>, StylePreference)>, DraftError> {
    let cfg = &config.cover;
    if !cfg.enabled {
        return Ok(None);
    }
    let style: StylePreference = cfg.style.parse()?;
    let chain = CoverChain::from_config(cfg, config.covers_dir(), env_key(OPENAI_KEY_VAR));
    if chain.is_empty() {
        tracing::warn!("Covers enabled but no cover method is available");
        return Ok(None);
    }
    Ok(Some((Arc::new(chain), style)))
}

impl PipelineFactory for ConfigPipelineFactory {
    fn build(&self, kind: ProviderKind) -> Result<Pipeline, DraftError> {
        let config = Config::current(&self.config);
        let providers = &config.providers;

        let mut pipeline = match kind {
            ProviderKind::Gemini => {
                let cfg = &providers.gemini;
                let provider: Arc<dyn ModelProvider> = Arc::new(GoogleProvider::with_base_url(
                    require_key(GEMINI_KEY_VAR)?,
                    cfg.base_url.clone(),
                    cfg.timeout_seconds,
                ));
                let prompts = build_prompts(&config, PromptSet::default())?;
                Pipeline::single(kind, ModelHandle::new(provider, &cfg.model), prompts)
            }
            ProviderKind::Zhipu => {
                let cfg = &providers.zhipu;
                let provider: Arc<dyn ModelProvider> = Arc::new(OpenAICompatProvider::new(
                    "zhipu",
                    require_key(ZHIPU_KEY_VAR)?,
                    cfg.base_url.clone(),
                    cfg.timeout_seconds,
                ));
                let prompts = build_prompts(&config, PromptSet::default())?;
                Pipeline::single(kind, ModelHandle::new(provider, &cfg.model), prompts)
            }
            ProviderKind::GeminiWeb => {
                let prompts = build_prompts(&config, PromptSet::default())?;
                Pipeline::single(kind, self.gemini_web(&config), prompts)
            }
            ProviderKind::GeminiDeepseek => {
                let cfg = &providers.deepseek;
                let deepseek: Arc<dyn ModelProvider> = Arc::new(OpenAICompatProvider::new(
                    "deepseek",
                    require_key(DEEPSEEK_KEY_VAR)?,
                    cfg.base_url.clone(),
                    cfg.timeout_seconds,
                ));
                let writer = ModelHandle::new(deepseek, &cfg.model).with_temperature(cfg.temperature);
                let web = self.gemini_web(&config);
                let prompts = build_prompts(&config, PromptSet::research())?;

                Pipeline {
                    kind,
                    generator: Arc::new(
                        LlmGenerator::split(web.clone(), writer, prompts.clone())
                            .with_domain_fallback(),
                    ),
                    scorer: Arc::new(LlmScorer::new(web.clone(), prompts.clone())),
                    rewriter: Arc::new(LlmRewriter::new(web, prompts)),
                    cover: None,
                    max_iterations: 2,
                }
            }
        };

        pipeline.max_iterations = kind.max_iterations(&config);
        pipeline.cover = build_cover(&config)?;
        tracing::debug!(
            provider = kind.id(),
            max_iterations = pipeline.max_iterations,
            cover = pipeline.cover.is_some(),
            "pipeline built"
        );
        Ok(pipeline)
    }
}
