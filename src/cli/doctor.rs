// src/cli/doctor.rs — Environment diagnostics

use std::path::Path;

use crate::infra::config::Config;
use crate::infra::errors::DraftError;
use crate::infra::paths;
use crate::provider::registry::{env_key, ProviderKind, OPENAI_KEY_VAR};
use crate::publish::wechat::{errcode_hint, WeChatClient, WeChatCredentials};

pub async fn run_doctor(config: &Config, config_path: &Path) -> anyhow::Result<()> {
    println!("autodraft doctor v{}", env!("CARGO_PKG_VERSION"));
    println!();

    // Config
    if config_path.exists() {
        println!("  config: {}", config_path.display());
    } else {
        println!("  config: {} (not found, using defaults)", config_path.display());
    }

    // Providers
    println!("  providers:");
    for kind in ProviderKind::ALL {
        let missing: Vec<&str> = kind
            .required_env()
            .iter()
            .copied()
            .filter(|var| env_key(var).is_none())
            .collect();
        let status = if missing.is_empty() {
            "ready".to_string()
        } else {
            format!("missing {}", missing.join(", "))
        };
        let marker = if kind.id() == config.pipeline.default_provider {
            " (default)"
        } else {
            ""
        };
        println!("    {:<16} {}{}", kind.id(), status, marker);
    }

    let web = &config.providers.gemini_web;
    match &web.workdir {
        Some(dir) if !Path::new(dir).is_dir() => {
            println!("    WARN: gemini-web workdir not found: {}", dir)
        }
        _ => {}
    }

    // Covers
    if config.cover.enabled {
        let dalle = if env_key(OPENAI_KEY_VAR).is_some() {
            "dalle available"
        } else {
            "dalle disabled (no OPENAI_API_KEY)"
        };
        println!(
            "  covers: {} style, methods [{}], {}",
            config.cover.style,
            config.cover.methods.join(", "),
            dalle
        );
    } else {
        println!("  covers: disabled");
    }

    // Storage
    for (name, dir) in [
        ("articles", config.articles_dir()),
        ("covers", config.covers_dir()),
        ("cache", paths::cache_dir()),
    ] {
        let state = if dir.is_dir() { "ok" } else { "will be created" };
        println!("  {}: {} ({})", name, dir.display(), state);
    }

    // WeChat
    print!("  wechat: ");
    match WeChatCredentials::from_env() {
        Err(e) => println!("not configured ({})", e),
        Ok(credentials) => {
            let app_id = credentials.masked_app_id();
            match WeChatClient::new(credentials, &config.wechat).access_token().await {
                Ok(_) => println!("ok (app id {})", app_id),
                Err(e) => {
                    println!("FAILED: {}", e);
                    if let DraftError::WeChat { errcode, .. } = e {
                        if let Some(hint) = errcode_hint(errcode) {
                            println!("    hint: {}", hint);
                        }
                    }
                }
            }
        }
    }

    // API token
    let token = env_key(crate::api::TOKEN_VAR).is_some() || config.server.token.is_some();
    println!(
        "  api token: {}",
        if token { "set" } else { "not set (API is open on its bind address)" }
    );

    Ok(())
}
