// src/cli/publish.rs — Upload a saved article to WeChat

use crate::infra::config::Config;
use crate::infra::errors::DraftError;
use crate::publish::publish_stored;
use crate::publish::wechat::{errcode_hint, WeChatClient, WeChatCredentials};
use crate::store::ArticleStore;

pub async fn run_publish(config: &Config, id: &str) -> anyhow::Result<()> {
    let store = ArticleStore::new(config.articles_dir());
    let article = store.get(id).await?;
    let client = WeChatClient::new(WeChatCredentials::from_env()?, &config.wechat);

    eprintln!("[wechat] uploading 《{}》...", article.title());
    match publish_stored(&client, &article, &config.covers_dir()).await {
        Ok(outcome) => {
            eprintln!("[wechat] draft saved (media id {})", outcome.media_id);
            if !outcome.with_cover {
                eprintln!("  no cover thumb; set [wechat] thumb_media_id to show one");
            }
            Ok(())
        }
        Err(DraftError::WeChat { errcode, errmsg }) => {
            if let Some(hint) = errcode_hint(errcode) {
                eprintln!("  hint: {}", hint);
            }
            Err(DraftError::WeChat { errcode, errmsg }.into())
        }
        Err(e) => Err(e.into()),
    }
}
