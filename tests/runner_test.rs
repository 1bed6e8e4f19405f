// tests/runner_test.rs — Integration test: background runs through the status board

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Notify;

use autodraft::core::runner::{RunManager, StartRequest};
use autodraft::core::state::RunPhase;
use autodraft::infra::config::Config;
use autodraft::infra::errors::DraftError;
use autodraft::pipeline::factory::{Pipeline, PipelineFactory};
use autodraft::pipeline::{Generator, Rewriter, Scorer, Topic};
use autodraft::provider::registry::ProviderKind;
use autodraft::store::{ArticleSink, ArticleStore, NewArticle};

/// Generator that waits for `gate` before proposing a topic.
struct GatedGenerator {
    gate: Arc<Notify>,
}

#[async_trait]
impl Generator for GatedGenerator {
    async fn propose_topic(&self, domain: &str) -> Result<Topic, DraftError> {
        self.gate.notified().await;
        Ok(Topic::parse(&format!("标题：《{}的选择》\n大纲：\n一、开头", domain)))
    }

    async fn write_draft(&self, title: &str, _outline: &str) -> Result<String, DraftError> {
        Ok(format!("{}\n\n这是一篇草稿。", title))
    }
}

struct ConstScorer(u8);

#[async_trait]
impl Scorer for ConstScorer {
    async fn score(&self, _text: &str) -> Result<u8, DraftError> {
        Ok(self.0)
    }
}

struct Echo;

#[async_trait]
impl Rewriter for Echo {
    async fn humanize(&self, text: &str, _current_score: u8) -> Result<String, DraftError> {
        Ok(format!("{}（改写）", text))
    }
}

struct MockFactory {
    gate: Arc<Notify>,
    score: u8,
}

impl PipelineFactory for MockFactory {
    fn build(&self, kind: ProviderKind) -> Result<Pipeline, DraftError> {
        Ok(Pipeline {
            kind,
            generator: Arc::new(GatedGenerator {
                gate: self.gate.clone(),
            }),
            scorer: Arc::new(ConstScorer(self.score)),
            rewriter: Arc::new(Echo),
            cover: None,
            max_iterations: 2,
        })
    }
}

/// Sink whose disk is always full.
struct FullDisk;

#[async_trait]
impl ArticleSink for FullDisk {
    async fn save(&self, _article: &NewArticle) -> Result<String, DraftError> {
        Err(DraftError::Persistence("No space left on device".into()))
    }
}

fn manager(score: u8, dir: &std::path::Path) -> (RunManager, Arc<Notify>, Arc<ArticleStore>) {
    let gate = Arc::new(Notify::new());
    let store = Arc::new(ArticleStore::new(dir));
    let sink: Arc<dyn ArticleSink> = store.clone();
    let m = RunManager::new(
        Arc::new(MockFactory {
            gate: gate.clone(),
            score,
        }),
        sink,
        Config::default().shared(),
    );
    (m, gate, store)
}

#[tokio::test]
async fn test_full_run_succeeds_and_persists() {
    let dir = tempfile::tempdir().unwrap();
    let (m, gate, store) = manager(12, dir.path());

    let started = m
        .start(StartRequest::new(ProviderKind::Zhipu, "职场"))
        .unwrap();
    gate.notify_one();
    started.handle.await.unwrap();

    let status = m.status();
    assert!(!status.running);
    assert_eq!(status.phase, RunPhase::Succeeded);
    assert_eq!(status.progress, 100);
    assert!(status.error.is_none());

    let result = status.result.unwrap();
    assert_eq!(result.title, "职场的选择");
    assert_eq!(result.score, 12);

    let stored = store.get(&result.id).await.unwrap();
    assert_eq!(stored.title(), "职场的选择");
    assert!(result.id.starts_with("article_zhipu_"));
}

#[tokio::test]
async fn test_second_start_is_rejected_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let (m, gate, _store) = manager(80, dir.path());

    let started = m
        .start(StartRequest::new(ProviderKind::Gemini, "情感"))
        .unwrap();
    let err = m
        .start(StartRequest::new(ProviderKind::Zhipu, "职场"))
        .unwrap_err();
    assert!(matches!(err, DraftError::RunInProgress));

    // The first run's state is untouched by the rejected start
    let status = m.status();
    assert!(status.running);
    assert_eq!(status.domain.as_deref(), Some("情感"));
    assert_eq!(status.run_id.as_deref(), Some(started.run_id.as_str()));

    gate.notify_one();
    started.handle.await.unwrap();
    let status = m.status();
    assert_eq!(status.phase, RunPhase::Succeeded);
    // Exhausted iterations: the earlier draft wins the tie
    assert_eq!(status.result.unwrap().score, 80);
}

#[tokio::test]
async fn test_stop_cancels_and_saves_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let (m, gate, store) = manager(10, dir.path());

    let started = m
        .start(StartRequest::new(ProviderKind::Gemini, "情感"))
        .unwrap();
    assert!(m.stop());
    gate.notify_one();
    started.handle.await.unwrap();

    let status = m.status();
    assert!(!status.running);
    assert_eq!(status.phase, RunPhase::Stopped);
    assert!(status.result.is_none());
    assert_eq!(store.list(1, 10).await.unwrap().pagination.total, 0);

    // The board is free again
    let again = m
        .start(StartRequest::new(ProviderKind::Gemini, "情感"))
        .unwrap();
    gate.notify_one();
    again.handle.await.unwrap();
    assert_eq!(m.status().phase, RunPhase::Succeeded);
}

#[tokio::test]
async fn test_save_failure_fails_the_run() {
    let gate = Arc::new(Notify::new());
    let m = RunManager::new(
        Arc::new(MockFactory {
            gate: gate.clone(),
            score: 10,
        }),
        Arc::new(FullDisk),
        Config::default().shared(),
    );

    let started = m
        .start(StartRequest::new(ProviderKind::Zhipu, "职场"))
        .unwrap();
    gate.notify_one();
    started.handle.await.unwrap();

    let status = m.status();
    assert!(!status.running);
    assert_eq!(status.phase, RunPhase::Failed);
    assert!(status.result.is_none());
    let error = status.error.unwrap();
    assert!(error.contains("No space left on device"), "{error}");
    assert!(status
        .logs
        .last()
        .unwrap()
        .message
        .contains("No space left on device"));
}
