// src/core/runner.rs — Background runs behind the status board

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::task::JoinHandle;

use super::orchestrator::Orchestrator;
use super::state::{board_progress, RunStatus, StatusBoard};
use super::types::{CancelFlag, LoopConfig, RunResult};
use crate::infra::config::{Config, SharedConfig};
use crate::infra::errors::DraftError;
use crate::pipeline::factory::PipelineFactory;
use crate::provider::registry::ProviderKind;
use crate::store::ArticleSink;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRequest {
    pub provider: ProviderKind,
    /// Empty means the configured default domain.
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub max_iterations: Option<u32>,
    #[serde(default)]
    pub target_score: Option<u8>,
}

impl StartRequest {
    pub fn new(provider: ProviderKind, domain: impl Into<String>) -> Self {
        Self {
            provider,
            domain: domain.into(),
            max_iterations: None,
            target_score: None,
        }
    }
}

/// A run that has been accepted and is executing on the runtime.
#[derive(Debug)]
pub struct StartedRun {
    pub run_id: String,
    pub handle: JoinHandle<()>,
}

/// Owns the single active run and the board observers read from.
pub struct RunManager {
    board: StatusBoard,
    factory: Arc<dyn PipelineFactory>,
    sink: Arc<dyn ArticleSink>,
    config: SharedConfig,
}

impl RunManager {
    pub fn new(
        factory: Arc<dyn PipelineFactory>,
        sink: Arc<dyn ArticleSink>,
        config: SharedConfig,
    ) -> Self {
        Self {
            board: StatusBoard::new(),
            factory,
            sink,
            config,
        }
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    pub fn status(&self) -> RunStatus {
        self.board.snapshot()
    }

    /// Claim the board and spawn the run. Must be called inside a tokio runtime.
    pub fn start(&self, request: StartRequest) -> Result<StartedRun, DraftError> {
        let defaults = Config::current(&self.config).pipeline;
        let domain = match request.domain.trim() {
            "" => defaults.domain,
            d => d.to_string(),
        };
        let kind = request.provider;
        let run_id = self.board.try_begin(kind.label(), &domain)?;
        // Raised already if a stop slipped in since try_begin; missing if a
        // newer run has replaced this one, which also means stop
        let flag = self.board.cancel_flag(&run_id).unwrap_or_else(|| {
            let flag = CancelFlag::new();
            flag.cancel();
            flag
        });

        tracing::info!(run_id = %run_id, provider = kind.id(), domain = %domain, "run started");

        let board = self.board.clone();
        let factory = self.factory.clone();
        let sink = self.sink.clone();
        let target = request.target_score.unwrap_or(defaults.target_score);
        let max_iterations = request.max_iterations;
        let id = run_id.clone();

        let worker = {
            let board = board.clone();
            let id = id.clone();
            tokio::spawn(async move {
                execute(
                    factory,
                    sink,
                    &board,
                    &id,
                    kind,
                    &domain,
                    max_iterations,
                    target,
                    flag,
                )
                .await
            })
        };

        // Supervises the worker so a panic still releases the board
        let handle = tokio::spawn(async move {
            match worker.await {
                Ok(Ok(result)) => {
                    tracing::info!(run_id = %id, article = %result.id, score = result.score, "run finished");
                    board.finish(&id, result);
                }
                Ok(Err(DraftError::Cancelled)) => {
                    tracing::info!(run_id = %id, "run cancelled");
                }
                Ok(Err(e)) => {
                    tracing::error!(run_id = %id, "run failed: {}", e);
                    board.fail(&id, &e);
                }
                Err(join) => {
                    tracing::error!(run_id = %id, "run aborted: {}", join);
                    let e = DraftError::Other(anyhow::anyhow!("run aborted unexpectedly: {}", join));
                    board.fail(&id, &e);
                }
            }
        });

        Ok(StartedRun { run_id, handle })
    }

    /// Stop the active run. Returns false when nothing was running.
    pub fn stop(&self) -> bool {
        self.board.stop()
    }
}

#[allow(clippy::too_many_arguments)]
async fn execute(
    factory: Arc<dyn PipelineFactory>,
    sink: Arc<dyn ArticleSink>,
    board: &StatusBoard,
    run_id: &str,
    kind: ProviderKind,
    domain: &str,
    max_iterations: Option<u32>,
    target_score: u8,
    cancel: CancelFlag,
) -> Result<RunResult, DraftError> {
    let pipeline = factory.build(kind)?;
    let config = LoopConfig::new(
        max_iterations.unwrap_or(pipeline.max_iterations),
        target_score,
    )?;

    let mut orchestrator = Orchestrator::new(
        pipeline.generator,
        pipeline.scorer,
        pipeline.rewriter,
        sink,
        config,
    )
    .with_provider(kind.label(), kind.slug())
    .with_cancel(cancel)
    .with_progress(board_progress(board.clone(), run_id.to_string(), None));

    if let Some((cover, style)) = pipeline.cover {
        orchestrator = orchestrator.with_cover(cover, style);
    }

    orchestrator.run(domain).await
}
