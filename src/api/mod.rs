// src/api/mod.rs — Dashboard and JSON API served over HTTP

pub mod auth;
pub mod handlers;
pub mod types;

use axum::http::request::Parts;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::core::runner::RunManager;
use crate::infra::config::{ServerConfig, SharedConfig};
use crate::store::ArticleStore;

pub const TOKEN_VAR: &str = "AUTODRAFT_API_TOKEN";

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub runner: Arc<RunManager>,
    pub store: Arc<ArticleStore>,
    pub config: SharedConfig,
    /// Where `POST /api/config` persists changes; in-memory only when unset.
    pub config_path: Option<PathBuf>,
    pub token: Option<String>,
}

fn is_local_origin(origin: &HeaderValue) -> bool {
    let Ok(origin) = origin.to_str() else {
        return false;
    };
    ["http://localhost", "http://127.0.0.1"].iter().any(|prefix| {
        origin
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(':'))
    })
}

/// Build the axum router with all routes.
pub fn build_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            |origin: &HeaderValue, _parts: &Parts| is_local_origin(origin),
        ))
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    Router::new()
        .route("/", get(handlers::dashboard))
        .route("/api/start", post(handlers::start))
        .route("/api/status", get(handlers::status))
        .route("/api/stop", post(handlers::stop))
        .route("/api/history", get(handlers::history))
        .route("/api/history/{id}", get(handlers::history_item))
        .route(
            "/api/config",
            get(handlers::get_config).post(handlers::save_config),
        )
        .route("/api/upload-wechat", post(handlers::upload_wechat))
        .route("/api/test-wechat", get(handlers::test_wechat))
        .route("/cover/{file}", get(handlers::cover))
        .route("/api/health", get(handlers::health))
        .layer(cors)
        .with_state(state)
}

/// Serve until Ctrl-C.
pub async fn start_server(config: &ServerConfig, state: ApiState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);

    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Dashboard listening on http://{addr}");
    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Shutting down");
        })
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::RunPhase;
    use crate::infra::config::Config;
    use crate::infra::errors::DraftError;
    use crate::pipeline::factory::{Pipeline, PipelineFactory};
    use crate::pipeline::{Generator, Rewriter, Scorer, Topic};
    use crate::provider::registry::ProviderKind;
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    /// Never finishes proposing a topic, so a started run stays active.
    struct Stalled;

    #[async_trait]
    impl Generator for Stalled {
        async fn propose_topic(&self, _domain: &str) -> Result<Topic, DraftError> {
            std::future::pending().await
        }
        async fn write_draft(&self, _title: &str, _outline: &str) -> Result<String, DraftError> {
            Ok(String::new())
        }
    }

    #[async_trait]
    impl Scorer for Stalled {
        async fn score(&self, _text: &str) -> Result<u8, DraftError> {
            Ok(0)
        }
    }

    #[async_trait]
    impl Rewriter for Stalled {
        async fn humanize(&self, text: &str, _score: u8) -> Result<String, DraftError> {
            Ok(text.to_string())
        }
    }

    struct StalledFactory;

    impl PipelineFactory for StalledFactory {
        fn build(&self, kind: ProviderKind) -> Result<Pipeline, DraftError> {
            Ok(Pipeline {
                kind,
                generator: Arc::new(Stalled),
                scorer: Arc::new(Stalled),
                rewriter: Arc::new(Stalled),
                cover: None,
                max_iterations: 2,
            })
        }
    }

    fn test_state(dir: &std::path::Path, token: Option<&str>) -> ApiState {
        let mut config = Config::default();
        config.storage.articles_dir = Some(dir.join("articles").to_string_lossy().into());
        config.storage.covers_dir = Some(dir.join("covers").to_string_lossy().into());
        let store = Arc::new(ArticleStore::new(config.articles_dir()));
        let config = config.shared();
        ApiState {
            runner: Arc::new(RunManager::new(
                Arc::new(StalledFactory),
                store.clone(),
                config.clone(),
            )),
            store,
            config,
            config_path: None,
            token: token.map(str::to_string),
        }
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path(), None));
        let resp = app.oneshot(get("/api/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_dashboard_served() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path(), None));
        let resp = app.oneshot(get("/")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_second_start_conflicts_then_stop() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), None);
        let app = build_router(state.clone());

        let body = r#"{"provider":"gemini-web","domain":"职场"}"#;
        let resp = app.clone().oneshot(post_json("/api/start", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.clone().oneshot(post_json("/api/start", body)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        assert_eq!(json_body(resp).await["error"], "Task already running");

        let status = state.runner.status();
        assert!(status.running);
        assert_eq!(status.domain.as_deref(), Some("职场"));

        let resp = app.clone().oneshot(post_json("/api/stop", "{}")).await.unwrap();
        assert_eq!(json_body(resp).await["success"], true);

        let resp = app.oneshot(get("/api/status")).await.unwrap();
        let status = json_body(resp).await;
        assert_eq!(status["running"], false);
        assert_eq!(status["current_step"], "Stopped by user");
        assert_eq!(state.runner.status().phase, RunPhase::Stopped);
    }

    #[tokio::test]
    async fn test_start_rejects_unknown_provider() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path(), None));
        let resp = app
            .oneshot(post_json("/api/start", r#"{"provider":"nope"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_history_empty_and_uncached() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path(), None));
        let resp = app.oneshot(get("/api/history?page=1&per_page=5")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.headers()["cache-control"],
            "no-cache, no-store, must-revalidate"
        );
        let body = json_body(resp).await;
        assert_eq!(body["pagination"]["per_page"], 5);
        assert_eq!(body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn test_history_item_rejects_bad_id() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path(), None));
        let resp = app.clone().oneshot(get("/api/history/notes.txt")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let resp = app.oneshot(get("/api/history/article_x.md")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_token_required_when_configured() {
        let dir = tempfile::tempdir().unwrap();
        let app = build_router(test_state(dir.path(), Some("s3cret")));

        let resp = app.clone().oneshot(get("/api/status")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = Request::builder()
            .uri("/api/status")
            .header("authorization", "Bearer s3cret")
            .body(Body::empty())
            .unwrap();
        assert_eq!(app.clone().oneshot(req).await.unwrap().status(), StatusCode::OK);

        // Health stays open without a token
        let resp = app.oneshot(get("/api/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_config_roundtrip_validates_templates() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), None);
        let app = build_router(state.clone());

        let resp = app
            .clone()
            .oneshot(post_json("/api/config", r#"{"prompts":{"topic":"{% if %}"}}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .clone()
            .oneshot(post_json(
                "/api/config",
                r#"{"prompts":{"topic":"Write about {{ domain }}"}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = app.oneshot(get("/api/config")).await.unwrap();
        let body = json_body(resp).await;
        assert_eq!(body["prompts"]["topic"], "Write about {{ domain }}");
        assert!(body["prompts"]["score"].as_str().unwrap().contains("AI 浓度"));
        assert_eq!(body["providers"].as_array().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_cover_served_with_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), None);
        let covers = dir.path().join("covers");
        std::fs::create_dir_all(&covers).unwrap();
        std::fs::write(covers.join("cover_1.svg"), "<svg/>").unwrap();
        let app = build_router(state);

        let resp = app.clone().oneshot(get("/cover/cover_1.svg")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()["content-type"], "image/svg+xml");

        let resp = app.oneshot(get("/cover/missing.png")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_local_origin_predicate() {
        assert!(is_local_origin(&HeaderValue::from_static("http://localhost:5173")));
        assert!(is_local_origin(&HeaderValue::from_static("http://127.0.0.1")));
        assert!(!is_local_origin(&HeaderValue::from_static("http://localhost.evil.com")));
        assert!(!is_local_origin(&HeaderValue::from_static("https://example.com")));
    }
}
