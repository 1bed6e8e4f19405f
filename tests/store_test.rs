// tests/store_test.rs — Integration test: article store round-trip on disk

use chrono::{Local, TimeZone};
use pretty_assertions::assert_eq;

use autodraft::infra::errors::DraftError;
use autodraft::store::{ArticleSink, ArticleStore, NewArticle};

fn article(title: &str, second: u32) -> NewArticle {
    NewArticle {
        title: title.into(),
        content: format!("# {}\n\n正文第一段。\n\n正文第二段。", title),
        score: 25,
        provider_label: "Zhipu GLM-4".into(),
        provider_slug: "zhipu".into(),
        cover: None,
        created_at: Local.with_ymd_and_hms(2026, 1, 1, 12, 0, second).unwrap(),
    }
}

#[tokio::test]
async fn test_save_then_get_and_list() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArticleStore::new(dir.path().join("articles"));

    let id = store.save(&article("别再讨好了", 0)).await.unwrap();
    assert_eq!(id, "article_zhipu_20260101_120000.md");

    let stored = store.get(&id).await.unwrap();
    assert_eq!(stored.title(), "别再讨好了");
    assert_eq!(stored.header.score, Some(25));
    assert_eq!(stored.header.provider.as_deref(), Some("Zhipu GLM-4"));
    assert_eq!(stored.header.time.as_deref(), Some("2026-01-01 12:00:00"));
    assert!(stored.body.starts_with("# 别再讨好了"));

    let page = store.list(1, 10).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    assert_eq!(page.history[0].id, id);
    assert_eq!(page.history[0].provider, "智谱 GLM");
    assert_eq!(page.history[0].ai_score, Some(25));
}

#[tokio::test]
async fn test_same_second_saves_get_suffixed_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArticleStore::new(dir.path());

    let first = store.save(&article("一", 5)).await.unwrap();
    let second = store.save(&article("二", 5)).await.unwrap();
    let third = store.save(&article("三", 5)).await.unwrap();

    assert_eq!(first, "article_zhipu_20260101_120005.md");
    assert_eq!(second, "article_zhipu_20260101_120005_2.md");
    assert_eq!(third, "article_zhipu_20260101_120005_3.md");
    assert_eq!(store.get(&second).await.unwrap().title(), "二");
}

#[tokio::test]
async fn test_pagination() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArticleStore::new(dir.path());
    for i in 0..7 {
        store.save(&article(&format!("第{}篇", i), i)).await.unwrap();
    }

    let first = store.list(1, 3).await.unwrap();
    assert_eq!(first.history.len(), 3);
    assert_eq!(first.pagination.total, 7);
    assert_eq!(first.pagination.total_pages, 3);

    let last = store.list(3, 3).await.unwrap();
    assert_eq!(last.history.len(), 1);

    let beyond = store.list(9, 3).await.unwrap();
    assert!(beyond.history.is_empty());
    assert_eq!(beyond.pagination.total, 7);

    // Every record appears exactly once across pages
    let mut ids: Vec<String> = Vec::new();
    for p in 1..=3 {
        ids.extend(store.list(p, 3).await.unwrap().history.into_iter().map(|a| a.id));
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 7);
}

#[tokio::test]
async fn test_missing_directory_lists_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArticleStore::new(dir.path().join("nope"));
    let page = store.list(1, 10).await.unwrap();
    assert!(page.history.is_empty());
    assert_eq!(page.pagination.total, 0);
}

#[tokio::test]
async fn test_legacy_record_is_listed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("article_gemini_20250301_080000.md"),
        "# 旧文章\n\n**Provider**: Gemini Web (gemini-cli)\n**AI Score**: 42%\n\n---\n\n正文",
    )
    .unwrap();
    std::fs::write(dir.path().join("notes.md"), "not an article").unwrap();

    let store = ArticleStore::new(dir.path());
    let page = store.list(1, 10).await.unwrap();
    assert_eq!(page.pagination.total, 1);
    let item = &page.history[0];
    assert_eq!(item.title, "旧文章");
    assert_eq!(item.provider, "Gemini Web");
    assert_eq!(item.ai_score, Some(42));
}

#[tokio::test]
async fn test_get_rejects_bad_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArticleStore::new(dir.path());

    for id in ["../secret.md", "notes.md", "article_x.txt", "article/../x.md"] {
        assert!(
            matches!(store.get(id).await, Err(DraftError::InvalidRecordId(_))),
            "{id} should be rejected"
        );
    }
    assert!(matches!(
        store.get("article_missing.md").await,
        Err(DraftError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_body_metadata_lines_do_not_leak_into_header() {
    let dir = tempfile::tempdir().unwrap();
    let store = ArticleStore::new(dir.path());

    let mut a = article("引用别人的话", 9);
    a.score = 20;
    a.provider_label = "Gemini API".into();
    a.content = "# 引用别人的话\n\n**Provider**: 某人\n**AI Score**: 90%\n\n正文".into();
    let id = store.save(&a).await.unwrap();

    let stored = store.get(&id).await.unwrap();
    assert_eq!(stored.header.score, Some(20));
    assert_eq!(stored.header.provider.as_deref(), Some("Gemini API"));
    assert!(stored.body.contains("**AI Score**: 90%"));

    let item = &store.list(1, 10).await.unwrap().history[0];
    assert_eq!(item.ai_score, Some(20));
    assert_eq!(item.provider, "Gemini API");
}
