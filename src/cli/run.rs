// src/cli/run.rs — Default command: one run in the foreground

use std::sync::Arc;

use super::RunArgs;
use crate::core::orchestrator::Orchestrator;
use crate::core::types::{CancelFlag, LoopConfig, RunResult};
use crate::infra::config::Config;
use crate::pipeline::factory::{ConfigPipelineFactory, PipelineFactory};
use crate::provider::registry::ProviderKind;
use crate::publish::wechat::{WeChatClient, WeChatCredentials};
use crate::store::ArticleStore;

/// Run the pipeline once, print the article to stdout and a summary to stderr.
pub async fn run_once(config: &Config, args: RunArgs) -> anyhow::Result<()> {
    let kind: ProviderKind = args
        .provider
        .as_deref()
        .unwrap_or(&config.pipeline.default_provider)
        .parse()?;
    let domain = args
        .domain
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| config.pipeline.domain.clone());

    let factory = ConfigPipelineFactory::new(config.clone().shared());
    let pipeline = factory.build(kind)?;
    let loop_config = LoopConfig::new(
        args.iterations.unwrap_or(pipeline.max_iterations),
        args.target.unwrap_or(config.pipeline.target_score),
    )?;

    let store = Arc::new(ArticleStore::new(config.articles_dir()));

    // Ctrl-C stops at the next step boundary
    let cancel = CancelFlag::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\n[stop] finishing current step...");
                cancel.cancel();
            }
        });
    }

    let mut orchestrator = Orchestrator::new(
        pipeline.generator,
        pipeline.scorer,
        pipeline.rewriter,
        store,
        loop_config,
    )
    .with_provider(kind.label(), kind.slug())
    .with_cancel(cancel);
    if let Some((cover, style)) = pipeline.cover {
        orchestrator = orchestrator.with_cover(cover, style);
    }
    if !args.quiet {
        orchestrator = orchestrator.with_progress(super::progress::terminal_progress());
        eprintln!(
            "[run] {} | domain: {} | max {} iteration(s), target < {}%",
            kind.label(),
            domain,
            loop_config.max_iterations,
            loop_config.target_score
        );
    }

    let result = orchestrator.run(&domain).await?;

    println!("{}", result.content);
    if !args.quiet {
        print_summary(&result);
    }

    if args.upload {
        let client = WeChatClient::new(WeChatCredentials::from_env()?, &config.wechat);
        let cover = result.cover.as_deref().map(|c| config.covers_dir().join(c));
        let outcome = client
            .publish(&result.title, &result.content, cover.as_deref())
            .await?;
        eprintln!("[wechat] draft saved (media id {})", outcome.media_id);
    }

    Ok(())
}

fn print_summary(result: &RunResult) {
    eprintln!();
    eprintln!("[done] 《{}》", result.title);
    eprintln!(
        "  AI score {}% after {} iteration(s)",
        result.score, result.iterations
    );
    for record in &result.history {
        eprintln!(
            "    #{} score={}% length={}",
            record.iteration, record.score, record.length
        );
    }
    if let Some(cover) = &result.cover {
        eprintln!("  cover: {}", cover);
    }
    eprintln!("  saved: {}", result.id);
}
