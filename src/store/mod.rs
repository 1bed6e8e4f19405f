// src/store/mod.rs — Article store: one flat file per finished run

pub mod record;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::io::AsyncWriteExt;

use crate::infra::errors::DraftError;
use record::{parse_header, render_record, short_provider, RecordHeader};

pub const DEFAULT_PER_PAGE: usize = 10;
const MAX_PER_PAGE: usize = 100;

/// Everything needed to persist one article.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub title: String,
    pub content: String,
    pub score: u8,
    /// Display label written to the header, e.g. "Zhipu GLM-4.7".
    pub provider_label: String,
    /// Filename-safe provider id, e.g. "zhipu".
    pub provider_slug: String,
    pub cover: Option<String>,
    pub created_at: DateTime<Local>,
}

/// Terminal persistence step of a run. Returns the record id.
#[async_trait]
pub trait ArticleSink: Send + Sync {
    async fn save(&self, article: &NewArticle) -> Result<String, DraftError>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleSummary {
    pub id: String,
    pub title: String,
    pub size: u64,
    /// Seconds since the Unix epoch.
    pub modified_time: f64,
    pub provider: String,
    pub ai_score: Option<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
    pub total: usize,
    pub total_pages: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPage {
    pub history: Vec<ArticleSummary>,
    pub pagination: Pagination,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredArticle {
    pub id: String,
    pub header: RecordHeader,
    /// Body without the header comment.
    pub body: String,
    /// Full file content.
    pub content: String,
}

impl StoredArticle {
    pub fn title(&self) -> &str {
        self.header.title.as_deref().unwrap_or(&self.id)
    }
}

/// Reject anything that is not a bare `article*.md` filename.
pub fn validate_id(id: &str) -> Result<(), DraftError> {
    let ok = !id.is_empty()
        && !id.contains('/')
        && !id.contains('\\')
        && !id.contains("..")
        && id.starts_with("article")
        && id.ends_with(".md");
    if ok {
        Ok(())
    } else {
        Err(DraftError::InvalidRecordId(id.to_string()))
    }
}

pub struct ArticleStore {
    dir: PathBuf,
}

impl ArticleStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Most recent first, paginated. Pages are 1-based; out-of-range pages are empty.
    pub async fn list(&self, page: usize, per_page: usize) -> Result<HistoryPage, DraftError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, MAX_PER_PAGE);

        let mut files: Vec<(String, SystemTime, u64)> = Vec::new();
        match tokio::fs::read_dir(&self.dir).await {
            Ok(mut entries) => {
                while let Some(entry) = entries.next_entry().await? {
                    let name = entry.file_name().to_string_lossy().to_string();
                    if validate_id(&name).is_err() {
                        continue;
                    }
                    let meta = entry.metadata().await?;
                    if !meta.is_file() {
                        continue;
                    }
                    let mtime = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
                    files.push((name, mtime, meta.len()));
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));

        let total = files.len();
        let total_pages = total.div_ceil(per_page);
        let start = (page - 1).saturating_mul(per_page);

        let mut history = Vec::new();
        for (name, mtime, size) in files.into_iter().skip(start).take(per_page) {
            let path = self.dir.join(&name);
            let header = match tokio::fs::read_to_string(&path).await {
                Ok(text) => parse_header(&text),
                Err(e) => {
                    tracing::warn!("Skipping unreadable record {}: {}", name, e);
                    continue;
                }
            };
            let modified_time = mtime
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs_f64())
                .unwrap_or(0.0);
            history.push(ArticleSummary {
                title: header.title.clone().unwrap_or_else(|| name.clone()),
                provider: header
                    .provider
                    .as_deref()
                    .map(short_provider)
                    .unwrap_or_else(|| "Unknown".into()),
                ai_score: header.score,
                id: name,
                size,
                modified_time,
            });
        }

        Ok(HistoryPage {
            history,
            pagination: Pagination {
                page,
                per_page,
                total,
                total_pages,
            },
        })
    }

    pub async fn get(&self, id: &str) -> Result<StoredArticle, DraftError> {
        validate_id(id)?;
        let path = self.dir.join(id);
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DraftError::NotFound(id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        Ok(StoredArticle {
            id: id.to_string(),
            header: parse_header(&content),
            body: record::body(&content).to_string(),
            content,
        })
    }

    /// Create the record file, adding `_N` to the stem if the name is taken.
    async fn create_unique(&self, stem: &str) -> Result<(String, tokio::fs::File), DraftError> {
        for n in 1..1000u32 {
            let id = if n == 1 {
                format!("{}.md", stem)
            } else {
                format!("{}_{}.md", stem, n)
            };
            let open = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(self.dir.join(&id))
                .await;
            match open {
                Ok(file) => return Ok((id, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(DraftError::Persistence(e.to_string())),
            }
        }
        Err(DraftError::Persistence(format!(
            "no free record name for {}",
            stem
        )))
    }
}

#[async_trait]
impl ArticleSink for ArticleStore {
    async fn save(&self, article: &NewArticle) -> Result<String, DraftError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| DraftError::Persistence(e.to_string()))?;

        let stem = format!(
            "article_{}_{}",
            article.provider_slug,
            article.created_at.format("%Y%m%d_%H%M%S")
        );
        let (id, file) = self.create_unique(&stem).await?;

        let text = render_record(
            &article.title,
            article.score,
            &article.provider_label,
            &article.created_at,
            article.cover.as_deref(),
            &article.content,
        );
        write_or_discard(&self.dir.join(&id), file, &text).await?;

        tracing::info!("Saved article {}", id);
        Ok(id)
    }
}

/// Write a freshly created record. On failure the partial file is removed so
/// history never lists it.
async fn write_or_discard(
    path: &Path,
    mut file: tokio::fs::File,
    text: &str,
) -> Result<(), DraftError> {
    let written: std::io::Result<()> = async {
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }
    .await;
    drop(file);

    if let Err(e) = written {
        if let Err(rm) = tokio::fs::remove_file(path).await {
            tracing::warn!("Could not remove partial record {}: {}", path.display(), rm);
        }
        return Err(DraftError::Persistence(e.to_string()));
    }
    Ok(())
}
