// src/api/handlers.rs

use crate::api::{auth, types::*, ApiState};
use crate::core::runner::StartRequest;
use crate::core::state::RunStatus;
use crate::cover::cover_url;
use crate::infra::config::Config;
use crate::infra::errors::DraftError;
use crate::pipeline::prompts::PromptSet;
use crate::provider::registry::ProviderKind;
use crate::publish::wechat::{errcode_hint, WeChatClient, WeChatCredentials, APP_ID_VAR, APP_SECRET_VAR};
use crate::publish::{publish_stored, strip_preview_cover};
use crate::store::{HistoryPage, DEFAULT_PER_PAGE};
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;

type ApiResult<T> = Result<T, (StatusCode, Json<ErrorResponse>)>;

const DASHBOARD_HTML: &str = include_str!("dashboard.html");

/// Map a domain error onto an HTTP status and body.
pub fn error_response(e: DraftError) -> (StatusCode, Json<ErrorResponse>) {
    let status = match &e {
        DraftError::RunInProgress => StatusCode::CONFLICT,
        DraftError::InvalidRecordId(_) | DraftError::Template(_) => StatusCode::BAD_REQUEST,
        DraftError::NotFound(_) => StatusCode::NOT_FOUND,
        DraftError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        DraftError::WeChat { .. } => StatusCode::BAD_GATEWAY,
        e if e.is_configuration() => StatusCode::BAD_REQUEST,
        e if e.is_provider() => StatusCode::BAD_GATEWAY,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let mut body = ErrorResponse::new(e.to_string());
    if let DraftError::WeChat { errcode, .. } = &e {
        body.errcode = Some(*errcode);
        body.hint = errcode_hint(*errcode).map(str::to_string);
    }
    (status, Json(body))
}

fn bad_request(message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(message)))
}

/// GET / — Embedded dashboard.
pub async fn dashboard() -> Html<&'static str> {
    Html(DASHBOARD_HTML)
}

/// POST /api/start — Start a run in the background.
pub async fn start(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<StartBody>,
) -> ApiResult<Json<StartedResponse>> {
    auth::check_auth(&state, &headers)?;

    let provider = match body.provider.as_deref() {
        Some(p) if !p.trim().is_empty() => p.to_string(),
        _ => Config::current(&state.config).pipeline.default_provider,
    };
    let kind: ProviderKind = provider.parse().map_err(error_response)?;

    let request = StartRequest {
        provider: kind,
        domain: body.domain.unwrap_or_default(),
        max_iterations: body.max_iterations,
        target_score: body.target_score,
    };
    let started = state.runner.start(request).map_err(error_response)?;

    Ok(Json(StartedResponse {
        success: true,
        run_id: started.run_id,
        message: format!("Task started with {}", kind.label()),
    }))
}

/// GET /api/status — Snapshot of the current run.
pub async fn status(State(state): State<ApiState>, headers: HeaderMap) -> ApiResult<Json<RunStatus>> {
    auth::check_auth(&state, &headers)?;
    Ok(Json(state.runner.status()))
}

/// POST /api/stop — Stop the active run.
pub async fn stop(State(state): State<ApiState>, headers: HeaderMap) -> ApiResult<Json<MessageResponse>> {
    auth::check_auth(&state, &headers)?;
    let stopped = state.runner.stop();
    Ok(Json(MessageResponse {
        success: stopped,
        message: if stopped {
            "Task stopped".into()
        } else {
            "No task running".into()
        },
    }))
}

/// GET /api/history — Saved articles, newest first.
pub async fn history(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Response> {
    auth::check_auth(&state, &headers)?;
    let page: HistoryPage = state
        .store
        .list(
            query.page.unwrap_or(1),
            query.per_page.unwrap_or(DEFAULT_PER_PAGE),
        )
        .await
        .map_err(error_response)?;

    let mut response = Json(serde_json::json!({
        "success": true,
        "history": page.history,
        "pagination": page.pagination,
    }))
    .into_response();
    let h = response.headers_mut();
    h.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    h.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    h.insert(header::EXPIRES, HeaderValue::from_static("0"));
    Ok(response)
}

/// GET /api/history/{id} — One saved article.
pub async fn history_item(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> ApiResult<Json<ArticleResponse>> {
    auth::check_auth(&state, &headers)?;
    let article = state.store.get(&id).await.map_err(error_response)?;
    Ok(Json(ArticleResponse {
        success: true,
        title: article.title().to_string(),
        id: article.id,
        score: article.header.score,
        provider: article.header.provider,
        time: article.header.time,
        cover: article.header.cover.as_deref().map(cover_url),
        body: article.body,
        content: article.content,
    }))
}

/// GET /api/config — Effective pipeline settings and prompt templates.
pub async fn get_config(State(state): State<ApiState>, headers: HeaderMap) -> ApiResult<Json<ConfigView>> {
    auth::check_auth(&state, &headers)?;
    let config = Config::current(&state.config);
    let prompts = PromptSet::default()
        .with_overrides(&config.prompts)
        .map_err(error_response)?;
    Ok(Json(ConfigView {
        success: true,
        providers: ProviderKind::ALL
            .into_iter()
            .map(|k| ProviderInfo::of(k, k.max_iterations(&config)))
            .collect(),
        pipeline: config.pipeline,
        prompts: prompts.templates(),
        cover: config.cover,
    }))
}

/// POST /api/config — Update settings; persisted when a config path is known.
pub async fn save_config(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(update): Json<ConfigUpdate>,
) -> ApiResult<Json<MessageResponse>> {
    auth::check_auth(&state, &headers)?;

    let mut next = Config::current(&state.config);
    if let Some(pipeline) = update.pipeline {
        if pipeline.target_score > 100 {
            return Err(bad_request("target_score must be within 0-100"));
        }
        pipeline
            .default_provider
            .parse::<ProviderKind>()
            .map_err(error_response)?;
        next.pipeline = pipeline;
    }
    if let Some(prompts) = update.prompts {
        PromptSet::default()
            .with_overrides(&prompts)
            .map_err(error_response)?;
        next.prompts = prompts;
    }
    if let Some(cover) = update.cover {
        cover
            .style
            .parse::<crate::cover::StylePreference>()
            .map_err(error_response)?;
        next.cover = cover;
    }

    if let Some(path) = &state.config_path {
        next.save_to(path)
            .map_err(|e| error_response(DraftError::Other(e)))?;
    }
    *state.config.write().unwrap_or_else(|e| e.into_inner()) = next;
    tracing::info!("Configuration updated via API");

    Ok(Json(MessageResponse {
        success: true,
        message: "Configuration saved".into(),
    }))
}

/// POST /api/upload-wechat — Upload an article to the WeChat draft box.
pub async fn upload_wechat(
    State(state): State<ApiState>,
    headers: HeaderMap,
    Json(body): Json<UploadBody>,
) -> ApiResult<Json<UploadResponse>> {
    auth::check_auth(&state, &headers)?;

    let credentials = WeChatCredentials::from_env().map_err(error_response)?;
    let config = Config::current(&state.config);
    let client = WeChatClient::new(credentials, &config.wechat);

    let outcome = match (body.id, body.title, body.content) {
        (Some(id), _, _) => {
            let article = state.store.get(&id).await.map_err(error_response)?;
            publish_stored(&client, &article, &config.covers_dir()).await
        }
        (None, Some(title), Some(content)) if !title.trim().is_empty() && !content.trim().is_empty() => {
            client
                .publish(title.trim(), strip_preview_cover(&content), None)
                .await
        }
        _ => return Err(bad_request("Title or content cannot be empty")),
    }
    .map_err(error_response)?;

    Ok(Json(UploadResponse {
        success: true,
        message: "Uploaded; check the draft box in the WeChat admin console".into(),
        media_id: outcome.media_id,
        with_cover: outcome.with_cover,
    }))
}

/// GET /api/test-wechat — Check WeChat credentials by fetching a token.
pub async fn test_wechat(State(state): State<ApiState>, headers: HeaderMap) -> ApiResult<Json<WeChatCheck>> {
    auth::check_auth(&state, &headers)?;

    let mut check = WeChatCheck {
        success: false,
        app_id: None,
        app_secret_set: crate::provider::registry::env_key(APP_SECRET_VAR).is_some(),
        access_token: None,
        message: None,
        error: None,
    };

    let credentials = match WeChatCredentials::from_env() {
        Ok(c) => c,
        Err(_) => {
            check.app_id = crate::provider::registry::env_key(APP_ID_VAR)
                .map(|id| crate::util::preview(&id, 10));
            check.error = Some(format!("{} or {} is not set", APP_ID_VAR, APP_SECRET_VAR));
            return Ok(Json(check));
        }
    };
    check.app_id = Some(credentials.masked_app_id());

    let config = Config::current(&state.config);
    match WeChatClient::new(credentials, &config.wechat).access_token().await {
        Ok(token) => {
            check.success = true;
            check.access_token = Some(crate::util::preview(&token, 20));
            check.message = Some("WeChat connection OK".into());
        }
        Err(e) => {
            let hint = match &e {
                DraftError::WeChat { errcode, .. } => errcode_hint(*errcode),
                _ => None,
            };
            check.error = Some(match hint {
                Some(h) => format!("{} ({})", e, h),
                None => e.to_string(),
            });
        }
    }
    Ok(Json(check))
}

/// GET /cover/{file} — Serve a generated cover image.
pub async fn cover(State(state): State<ApiState>, Path(file): Path<String>) -> ApiResult<Response> {
    if file.is_empty() || file.contains('/') || file.contains('\\') || file.contains("..") {
        return Err(bad_request("Invalid filename"));
    }
    let path = Config::current(&state.config).covers_dir().join(&file);
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err((
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!("Cover '{}' not found", file))),
            ))
        }
        Err(e) => return Err(error_response(e.into())),
    };

    let content_type = match file.rsplit('.').next().map(str::to_ascii_lowercase).as_deref() {
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    };
    Ok(([(header::CONTENT_TYPE, content_type)], bytes).into_response())
}

/// GET /api/health — Simple health check.
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_statuses() {
        assert_eq!(error_response(DraftError::RunInProgress).0, StatusCode::CONFLICT);
        assert_eq!(
            error_response(DraftError::NotFound("x".into())).0,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            error_response(DraftError::InvalidRecordId("../x".into())).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_error_categories_map_to_statuses() {
        let missing = DraftError::MissingCredential {
            env_var: "ZHIPU_API_KEY".into(),
        };
        assert_eq!(error_response(missing).0, StatusCode::BAD_REQUEST);
        assert_eq!(
            error_response(DraftError::Config("bad".into())).0,
            StatusCode::BAD_REQUEST
        );
        let provider = DraftError::Provider {
            provider: "zhipu".into(),
            message: "HTTP 500".into(),
        };
        assert_eq!(error_response(provider).0, StatusCode::BAD_GATEWAY);
        let timeout = DraftError::Timeout {
            provider: "google".into(),
            seconds: 120,
        };
        assert_eq!(error_response(timeout).0, StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            error_response(DraftError::Persistence("disk".into())).0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_wechat_error_carries_hint() {
        let (status, Json(body)) = error_response(DraftError::WeChat {
            errcode: 40164,
            errmsg: "invalid ip".into(),
        });
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.errcode, Some(40164));
        assert!(body.hint.unwrap().contains("whitelist"));
    }
}
