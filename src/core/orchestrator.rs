// src/core/orchestrator.rs — Iteration controller
//
// topic -> draft -> (score -> decide -> rewrite)* -> cover -> save

use chrono::Local;
use std::sync::Arc;

use super::extract::WORST_SCORE;
use super::types::*;
use crate::cover::{cover_url, CoverGenerator, CoverImage, StylePreference};
use crate::infra::errors::DraftError;
use crate::pipeline::{Generator, Rewriter, Scorer};
use crate::store::{ArticleSink, NewArticle};

const PERCENT_TOPIC: u8 = 10;
const PERCENT_DRAFT: u8 = 30;
const PERCENT_OPTIMIZE: u8 = 50;
const PERCENT_OPTIMIZE_MAX: u8 = 85;
const PERCENT_COVER: u8 = 90;
const PERCENT_SAVE: u8 = 100;

/// Drives one score-guided rewrite loop and persists the best draft.
pub struct Orchestrator {
    generator: Arc<dyn Generator>,
    scorer: Arc<dyn Scorer>,
    rewriter: Arc<dyn Rewriter>,
    sink: Arc<dyn ArticleSink>,
    config: LoopConfig,
    provider_label: String,
    provider_slug: String,
    cover: Option<(Arc<dyn CoverGenerator>, StylePreference)>,
    cancel: Option<CancelFlag>,
    /// Optional callback for real-time progress events.
    on_progress: Option<Box<dyn Fn(ProgressEvent) + Send + Sync>>,
}

impl Orchestrator {
    pub fn new(
        generator: Arc<dyn Generator>,
        scorer: Arc<dyn Scorer>,
        rewriter: Arc<dyn Rewriter>,
        sink: Arc<dyn ArticleSink>,
        config: LoopConfig,
    ) -> Self {
        Self {
            generator,
            scorer,
            rewriter,
            sink,
            config,
            provider_label: "Custom".into(),
            provider_slug: "custom".into(),
            cover: None,
            cancel: None,
            on_progress: None,
        }
    }

    /// Label written to the record header and the slug used in its id.
    pub fn with_provider(mut self, label: impl Into<String>, slug: impl Into<String>) -> Self {
        self.provider_label = label.into();
        self.provider_slug = slug.into();
        self
    }

    pub fn with_cover(mut self, generator: Arc<dyn CoverGenerator>, style: StylePreference) -> Self {
        self.cover = Some((generator, style));
        self
    }

    /// Checked between steps; a raised flag ends the run with `DraftError::Cancelled`.
    pub fn with_cancel(mut self, flag: CancelFlag) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Set a callback for real-time progress events.
    pub fn with_progress(mut self, cb: impl Fn(ProgressEvent) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Box::new(cb));
        self
    }

    /// Fire a progress event if a callback is set.
    fn emit(&self, event: ProgressEvent) {
        if let Some(ref cb) = self.on_progress {
            cb(event);
        }
    }

    fn step(&self, percent: u8, step: impl Into<String>) {
        self.emit(ProgressEvent::Step {
            percent,
            step: step.into(),
        });
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Info | LogLevel::Success => tracing::info!("{}", message),
        }
        self.emit(ProgressEvent::Log { level, message });
    }

    fn checkpoint(&self) -> Result<(), DraftError> {
        match &self.cancel {
            Some(flag) if flag.is_cancelled() => Err(DraftError::Cancelled),
            _ => Ok(()),
        }
    }

    /// Run the full loop for `domain`. Capability errors abort the run unchanged.
    pub async fn run(&self, domain: &str) -> Result<RunResult, DraftError> {
        let max = self.config.max_iterations;
        let target = self.config.target_score;

        // 1. Topic
        self.checkpoint()?;
        self.step(PERCENT_TOPIC, "Researching topic...");
        self.log(LogLevel::Info, "Step 1/5: Proposing a topic");
        let topic = self.generator.propose_topic(domain).await?;
        let title = match topic.title {
            Some(title) => title,
            None => {
                let fallback = self.generator.fallback_title(domain);
                self.log(
                    LogLevel::Warning,
                    format!("No 《title》 in topic reply, using \"{}\"", fallback),
                );
                fallback
            }
        };
        self.log(LogLevel::Success, format!("Title: {}", title));

        // 2. Draft
        self.checkpoint()?;
        self.step(PERCENT_DRAFT, "Writing article...");
        self.log(LogLevel::Info, "Step 2/5: Writing article");
        let mut draft = self.generator.write_draft(&title, &topic.outline).await?;
        self.log(
            LogLevel::Success,
            format!("Article written: {} characters", draft.chars().count()),
        );

        // 3. Score / rewrite loop
        self.step(PERCENT_OPTIMIZE, "Optimizing (reducing AI score)...");
        self.log(
            LogLevel::Info,
            format!("Step 3/5: AI rate optimization (max {} iterations)", max),
        );

        let mut best = Candidate::new(draft.clone(), WORST_SCORE);
        let mut history: Vec<IterationRecord> = Vec::new();

        for i in 1..=max {
            self.checkpoint()?;
            self.log(LogLevel::Info, format!("Iteration {}/{}: Checking AI score...", i, max));

            let score = self.scorer.score(&draft).await?.min(100);
            history.push(IterationRecord {
                iteration: i,
                score,
                length: draft.chars().count(),
            });
            if best.is_beaten_by(score) {
                best = Candidate::new(draft.clone(), score);
            }

            let decision = self.config.decide(i, score);
            let level = if score < target {
                LogLevel::Success
            } else {
                LogLevel::Info
            };
            self.log(level, format!("  AI Score: {}%", score));
            self.emit(ProgressEvent::Scored {
                iteration: i,
                max_iterations: max,
                score,
                best_score: best.score,
                decision,
            });

            match decision {
                IterationDecision::Accept => {
                    self.log(
                        LogLevel::Success,
                        format!("  Success! AI rate below {}%", target),
                    );
                    break;
                }
                IterationDecision::AcceptBest => {
                    self.log(
                        LogLevel::Warning,
                        format!("  Max iterations reached, using best score: {}%", best.score),
                    );
                    break;
                }
                IterationDecision::Continue => {}
            }

            self.checkpoint()?;
            self.log(LogLevel::Info, "  Rewriting to humanize...");
            draft = self.rewriter.humanize(&draft, score).await?;

            let percent = (u32::from(PERCENT_OPTIMIZE) + i.saturating_mul(10))
                .min(u32::from(PERCENT_OPTIMIZE_MAX)) as u8;
            self.step(percent, format!("Optimizing (iteration {}/{})...", i, max));
        }

        let Candidate {
            content,
            score: best_score,
        } = best;

        // 4. Cover (never fatal)
        self.checkpoint()?;
        let cover = self.make_cover(&title, &content).await.map(|c| c.file_name);

        // 5. Save
        self.checkpoint()?;
        self.step(PERCENT_SAVE, "Saving article...");
        self.log(LogLevel::Info, "Step 5/5: Saving article");
        let created_at = Local::now();
        let id = self
            .sink
            .save(&NewArticle {
                title: title.clone(),
                content: content.clone(),
                score: best_score,
                provider_label: self.provider_label.clone(),
                provider_slug: self.provider_slug.clone(),
                cover: cover.clone(),
                created_at,
            })
            .await?;
        self.log(LogLevel::Success, format!("Article saved: {}", id));

        let preview = preview_content(&content, cover.as_deref().map(cover_url).as_deref());
        self.log(LogLevel::Success, "Complete!");

        Ok(RunResult {
            id,
            title,
            content,
            preview,
            score: best_score,
            iterations: history.len() as u32,
            history,
            cover,
            provider: self.provider_label.clone(),
            created_at,
        })
    }

    async fn make_cover(&self, title: &str, content: &str) -> Option<CoverImage> {
        let (generator, preference) = self.cover.as_ref()?;
        self.step(PERCENT_COVER, "Generating cover image...");

        let style = preference.resolve(content);
        self.log(
            LogLevel::Info,
            format!("Step 4/5: Generating cover image ({} style)", style),
        );

        match generator.generate(title, content, style).await {
            Ok(Some(image)) => {
                self.log(
                    LogLevel::Success,
                    format!(
                        "  Cover generated: {} (method: {})",
                        image.file_name, image.method
                    ),
                );
                Some(image)
            }
            Ok(None) => {
                self.log(LogLevel::Warning, "  Cover generation skipped: no method produced an image");
                None
            }
            Err(e) => {
                self.log(LogLevel::Warning, format!("  Cover generation error: {}", e));
                None
            }
        }
    }
}
