// src/publish/wechat.rs — WeChat Official Account draft upload
//
// Uses the platform's HTTP API (https://developers.weixin.qq.com/doc/offiaccount/).
// Every response may carry `errcode`/`errmsg`; a non-zero code is an error
// even with HTTP 200.

use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use super::markdown_to_html;
use crate::infra::config::WeChatConfig;
use crate::infra::errors::DraftError;
use crate::provider::registry::env_key;
use crate::provider::transport_error;

pub const APP_ID_VAR: &str = "WECHAT_APP_ID";
pub const APP_SECRET_VAR: &str = "WECHAT_APP_SECRET";
const PROVIDER_ID: &str = "wechat";

/// Thumb formats the material API accepts.
const THUMB_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Debug, Clone)]
pub struct WeChatCredentials {
    pub app_id: String,
    pub app_secret: String,
}

impl WeChatCredentials {
    pub fn from_env() -> Result<Self, DraftError> {
        let app_id = env_key(APP_ID_VAR).ok_or_else(|| DraftError::MissingCredential {
            env_var: APP_ID_VAR.into(),
        })?;
        let app_secret = env_key(APP_SECRET_VAR).ok_or_else(|| DraftError::MissingCredential {
            env_var: APP_SECRET_VAR.into(),
        })?;
        Ok(Self { app_id, app_secret })
    }

    /// App id shortened for display.
    pub fn masked_app_id(&self) -> String {
        crate::util::preview(&self.app_id, 10)
    }
}

/// Human hint for well-known error codes.
pub fn errcode_hint(errcode: i64) -> Option<&'static str> {
    match errcode {
        40001 => Some("AppID or AppSecret may be wrong; check WECHAT_APP_ID and WECHAT_APP_SECRET"),
        40164 => Some(
            "Caller IP is not whitelisted; add this server's IP under Settings > Basic configuration > IP whitelist",
        ),
        45009 => Some("API call quota exceeded; try again later"),
        40006 => Some("Article content is malformed"),
        _ => None,
    }
}

/// One entry of a `draft/add` request.
#[derive(Debug, Clone, Serialize)]
pub struct DraftArticle {
    pub title: String,
    pub author: String,
    pub digest: String,
    pub content: String,
    pub content_source_url: String,
    pub thumb_media_id: String,
    pub show_cover_pic: u8,
    pub need_open_comment: u8,
    pub only_fans_can_comment: u8,
}

impl DraftArticle {
    /// Draft from a markdown body; the cover is shown only with a thumb.
    pub fn from_markdown(title: &str, markdown: &str, author: &str, thumb: Option<String>) -> Self {
        Self {
            title: title.to_string(),
            author: author.to_string(),
            digest: format!("{} - AI自动生成", title),
            content: markdown_to_html(markdown),
            content_source_url: String::new(),
            show_cover_pic: u8::from(thumb.is_some()),
            thumb_media_id: thumb.unwrap_or_default(),
            need_open_comment: 1,
            only_fans_can_comment: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishOutcome {
    pub media_id: String,
    /// Whether the draft carries a cover thumb.
    pub with_cover: bool,
}

#[derive(Deserialize)]
struct ApiReply {
    #[serde(default)]
    errcode: i64,
    #[serde(default)]
    errmsg: String,
    access_token: Option<String>,
    media_id: Option<String>,
}

pub struct WeChatClient {
    client: Client,
    credentials: WeChatCredentials,
    base_url: String,
    author: String,
    default_thumb: Option<String>,
    timeout_secs: u64,
}

impl WeChatClient {
    pub fn new(credentials: WeChatCredentials, config: &WeChatConfig) -> Self {
        Self {
            client: Client::new(),
            credentials,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            author: config.author.clone(),
            default_thumb: config.thumb_media_id.clone().filter(|s| !s.is_empty()),
            timeout_secs: config.timeout_seconds,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/cgi-bin/{}", self.base_url, path)
    }

    async fn read_reply(&self, request: reqwest::RequestBuilder) -> Result<ApiReply, DraftError> {
        let response = request
            .timeout(Duration::from_secs(self.timeout_secs))
            .send()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, self.timeout_secs, e))?;
        if !response.status().is_success() {
            return Err(crate::provider::status_error(PROVIDER_ID, response).await);
        }
        let reply: ApiReply = response
            .json()
            .await
            .map_err(|e| transport_error(PROVIDER_ID, self.timeout_secs, e))?;
        if reply.errcode != 0 {
            if let Some(hint) = errcode_hint(reply.errcode) {
                tracing::warn!("WeChat errcode {}: {}", reply.errcode, hint);
            }
            return Err(DraftError::WeChat {
                errcode: reply.errcode,
                errmsg: reply.errmsg,
            });
        }
        Ok(reply)
    }

    fn missing(field: &str) -> DraftError {
        DraftError::Provider {
            provider: PROVIDER_ID.into(),
            message: format!("Response has no {}", field),
        }
    }

    pub async fn access_token(&self) -> Result<String, DraftError> {
        let request = self.client.get(self.url("token")).query(&[
            ("grant_type", "client_credential"),
            ("appid", self.credentials.app_id.as_str()),
            ("secret", self.credentials.app_secret.as_str()),
        ]);
        self.read_reply(request)
            .await?
            .access_token
            .ok_or_else(|| Self::missing("access_token"))
    }

    /// Upload a permanent thumb image and return its media id.
    pub async fn upload_thumb(&self, token: &str, image: &Path) -> Result<String, DraftError> {
        let bytes = tokio::fs::read(image).await?;
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "cover.png".into());
        let form = Form::new().part("media", Part::bytes(bytes).file_name(file_name));

        let request = self
            .client
            .post(self.url("material/add_material"))
            .query(&[("access_token", token), ("type", "thumb")])
            .multipart(form);
        self.read_reply(request)
            .await?
            .media_id
            .ok_or_else(|| Self::missing("media_id"))
    }

    pub async fn add_draft(&self, token: &str, article: &DraftArticle) -> Result<String, DraftError> {
        let body = serde_json::json!({ "articles": [article] });
        let request = self
            .client
            .post(self.url("draft/add"))
            .query(&[("access_token", token)])
            .json(&body);
        self.read_reply(request)
            .await?
            .media_id
            .ok_or_else(|| Self::missing("media_id"))
    }

    /// Upload `markdown` as a draft. The cover is uploaded as its thumb when
    /// it is an accepted image; otherwise the configured thumb is used, and
    /// without either the draft hides its cover.
    pub async fn publish(
        &self,
        title: &str,
        markdown: &str,
        cover: Option<&Path>,
    ) -> Result<PublishOutcome, DraftError> {
        let token = self.access_token().await?;

        let mut thumb = None;
        if let Some(path) = cover.filter(|p| is_thumb_image(p)) {
            match self.upload_thumb(&token, path).await {
                Ok(id) => thumb = Some(id),
                Err(e) => tracing::warn!("Cover upload failed, continuing without it: {}", e),
            }
        }
        let thumb = thumb.or_else(|| self.default_thumb.clone());
        if thumb.is_none() {
            tracing::warn!("No thumb media id available; the draft will not show a cover");
        }

        let article = DraftArticle::from_markdown(title, markdown, &self.author, thumb);
        let with_cover = article.show_cover_pic == 1;
        let media_id = self.add_draft(&token, &article).await?;
        tracing::info!(media_id = %media_id, "WeChat draft saved");
        Ok(PublishOutcome {
            media_id,
            with_cover,
        })
    }
}

fn is_thumb_image(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| THUMB_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_hints() {
        assert!(errcode_hint(40001).unwrap().contains("AppSecret"));
        assert!(errcode_hint(40164).unwrap().contains("whitelist"));
        assert!(errcode_hint(45009).is_some());
        assert!(errcode_hint(40006).is_some());
        assert!(errcode_hint(-1).is_none());
    }

    #[test]
    fn test_draft_without_thumb_hides_cover() {
        let a = DraftArticle::from_markdown("标题", "正文", "AI助手", None);
        assert_eq!(a.show_cover_pic, 0);
        assert_eq!(a.thumb_media_id, "");
        assert_eq!(a.digest, "标题 - AI自动生成");
        assert_eq!(a.need_open_comment, 1);
        assert_eq!(a.only_fans_can_comment, 0);
        assert_eq!(a.content, "<p>正文</p>\n");
    }

    #[test]
    fn test_draft_with_thumb_shows_cover() {
        let a = DraftArticle::from_markdown("t", "b", "me", Some("MEDIA".into()));
        assert_eq!(a.show_cover_pic, 1);
        assert_eq!(a.thumb_media_id, "MEDIA");
    }

    #[test]
    fn test_thumb_image_filter() {
        let dir = tempfile::tempdir().unwrap();
        let png = dir.path().join("cover.PNG");
        let svg = dir.path().join("cover.svg");
        std::fs::write(&png, b"x").unwrap();
        std::fs::write(&svg, b"<svg/>").unwrap();
        assert!(is_thumb_image(&png));
        assert!(!is_thumb_image(&svg));
        assert!(!is_thumb_image(&dir.path().join("missing.png")));
    }

    #[test]
    fn test_masked_app_id() {
        let c = WeChatCredentials {
            app_id: "wx1234567890abcdef".into(),
            app_secret: "s".into(),
        };
        assert_eq!(c.masked_app_id(), "wx12345678...");
    }
}
