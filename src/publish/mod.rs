// src/publish/mod.rs — Publishing saved articles

pub mod wechat;

use pulldown_cmark::{html, Options, Parser};
use std::path::Path;

use crate::infra::errors::DraftError;
use crate::store::StoredArticle;
use wechat::{PublishOutcome, WeChatClient};

/// Render markdown as the HTML fragment the editor expects.
pub fn markdown_to_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let parser = Parser::new_ext(markdown, options);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Drop a leading cover image line added for previews; it links a local URL.
pub fn strip_preview_cover(content: &str) -> &str {
    let trimmed = content.trim_start();
    if trimmed.starts_with("![") {
        if let Some(end) = trimmed.find('\n') {
            if trimmed[..end].contains("](/cover/") {
                return trimmed[end..].trim_start();
            }
        }
    }
    content
}

/// Publish a stored record, using its cover file when present.
pub async fn publish_stored(
    client: &WeChatClient,
    article: &StoredArticle,
    covers_dir: &Path,
) -> Result<PublishOutcome, DraftError> {
    let cover = article.header.cover.as_deref().map(|c| covers_dir.join(c));
    client
        .publish(article.title(), article.body.trim(), cover.as_deref())
        .await
}
