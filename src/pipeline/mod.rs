// src/pipeline/mod.rs — Capabilities driven by the optimisation loop
//
// A pipeline is one generator, one scorer and one rewriter. Each may be
// backed by a different provider.

pub mod factory;
pub mod llm;
pub mod prompts;

use async_trait::async_trait;

use crate::core::extract::{extract_outline, extract_title, FALLBACK_TITLE};
use crate::infra::errors::DraftError;

/// A proposed topic, as scraped from the generator's reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic {
    /// `None` when the reply carried no usable title.
    pub title: Option<String>,
    pub outline: String,
}

impl Topic {
    pub fn parse(reply: &str) -> Self {
        Self {
            title: extract_title(reply),
            outline: extract_outline(reply),
        }
    }
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn propose_topic(&self, domain: &str) -> Result<Topic, DraftError>;

    async fn write_draft(&self, title: &str, outline: &str) -> Result<String, DraftError>;

    /// Title to use when the topic reply has none.
    fn fallback_title(&self, _domain: &str) -> String {
        FALLBACK_TITLE.to_string()
    }
}

#[async_trait]
pub trait Scorer: Send + Sync {
    /// AI-likeness in [0, 100]; lower reads more human.
    async fn score(&self, text: &str) -> Result<u8, DraftError>;
}

#[async_trait]
pub trait Rewriter: Send + Sync {
    async fn humanize(&self, text: &str, current_score: u8) -> Result<String, DraftError>;
}
