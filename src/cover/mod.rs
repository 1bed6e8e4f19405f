// src/cover/mod.rs — Cover image generation
//
// Covers are optional: every failure is logged and the run carries on
// without one.

pub mod dalle;
pub mod placeholder;
pub mod style;

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

use crate::infra::config::CoverConfig;
use crate::infra::errors::DraftError;
pub use style::{CoverStyle, StylePreference};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverImage {
    /// Name inside the covers directory; served under `/cover/`.
    pub file_name: String,
    pub path: PathBuf,
    pub method: String,
}

/// URL under which the dashboard serves a cover file.
pub fn cover_url(file_name: &str) -> String {
    format!("/cover/{}", file_name)
}

#[async_trait]
pub trait CoverGenerator: Send + Sync {
    fn method(&self) -> &str;

    /// `Ok(None)` means no cover was produced, which is not an error.
    async fn generate(
        &self,
        title: &str,
        text: &str,
        style: CoverStyle,
    ) -> Result<Option<CoverImage>, DraftError>;
}

/// Tries each generator in order until one produces an image.
pub struct CoverChain {
    generators: Vec<Arc<dyn CoverGenerator>>,
}

impl CoverChain {
    pub fn new(generators: Vec<Arc<dyn CoverGenerator>>) -> Self {
        Self { generators }
    }

    /// Build the configured methods. `dalle` is skipped without an OpenAI key.
    pub fn from_config(
        config: &CoverConfig,
        out_dir: PathBuf,
        openai_key: Option<String>,
    ) -> Self {
        let mut generators: Vec<Arc<dyn CoverGenerator>> = Vec::new();
        for method in &config.methods {
            match method.trim() {
                "dalle" => match &openai_key {
                    Some(key) => generators.push(Arc::new(dalle::DalleCover::new(
                        key.clone(),
                        config,
                        out_dir.clone(),
                    ))),
                    None => tracing::debug!("OPENAI_API_KEY not set, skipping dalle covers"),
                },
                "placeholder" => {
                    generators.push(Arc::new(placeholder::PlaceholderCover::new(out_dir.clone())))
                }
                other => tracing::warn!("Unknown cover method '{}', ignoring", other),
            }
        }
        Self { generators }
    }

    pub fn is_empty(&self) -> bool {
        self.generators.is_empty()
    }

    pub fn methods(&self) -> Vec<String> {
        self.generators.iter().map(|g| g.method().to_string()).collect()
    }
}

#[async_trait]
impl CoverGenerator for CoverChain {
    fn method(&self) -> &str {
        "chain"
    }

    async fn generate(
        &self,
        title: &str,
        text: &str,
        style: CoverStyle,
    ) -> Result<Option<CoverImage>, DraftError> {
        for g in &self.generators {
            match g.generate(title, text, style).await {
                Ok(Some(image)) => return Ok(Some(image)),
                Ok(None) => tracing::debug!("Cover method {} produced nothing", g.method()),
                Err(e) => tracing::warn!("Cover method {} failed: {}", g.method(), e),
            }
        }
        Ok(None)
    }
}
