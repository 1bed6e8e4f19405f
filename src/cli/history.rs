// src/cli/history.rs — List and show saved articles

use chrono::{DateTime, Local};
use std::time::{Duration, UNIX_EPOCH};

use crate::infra::config::Config;
use crate::store::{ArticleStore, ArticleSummary};
use crate::util::preview;

pub async fn list(config: &Config, page: usize, per_page: usize) -> anyhow::Result<()> {
    let store = ArticleStore::new(config.articles_dir());
    let result = store.list(page, per_page).await?;

    if result.history.is_empty() {
        println!("No articles in {}", store.dir().display());
        return Ok(());
    }

    for item in &result.history {
        println!("{}", format_row(item));
    }
    let p = &result.pagination;
    println!();
    println!(
        "Page {}/{} ({} article(s))",
        p.page,
        p.total_pages.max(1),
        p.total
    );
    Ok(())
}

pub async fn show(config: &Config, id: &str) -> anyhow::Result<()> {
    let store = ArticleStore::new(config.articles_dir());
    let article = store.get(id).await?;

    eprintln!("《{}》", article.title());
    if let Some(provider) = &article.header.provider {
        eprintln!("  provider: {}", provider);
    }
    if let Some(score) = article.header.score {
        eprintln!("  AI score: {}%", score);
    }
    if let Some(time) = &article.header.time {
        eprintln!("  time: {}", time);
    }
    if let Some(cover) = &article.header.cover {
        eprintln!("  cover: {}", config.covers_dir().join(cover).display());
    }
    eprintln!();
    println!("{}", article.body.trim());
    Ok(())
}

fn format_row(item: &ArticleSummary) -> String {
    let modified: DateTime<Local> =
        (UNIX_EPOCH + Duration::from_secs_f64(item.modified_time.max(0.0))).into();
    let score = item
        .ai_score
        .map(|s| format!("{:>3}%", s))
        .unwrap_or_else(|| "   -".into());
    format!(
        "{}  {}  {:<22} {}\n    {}",
        modified.format("%Y-%m-%d %H:%M"),
        score,
        item.provider,
        preview(&item.title, 30),
        item.id
    )
}
