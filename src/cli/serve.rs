// src/cli/serve.rs — Start the dashboard server

use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{self, ApiState, TOKEN_VAR};
use crate::core::runner::RunManager;
use crate::infra::config::Config;
use crate::pipeline::factory::ConfigPipelineFactory;
use crate::provider::registry::env_key;
use crate::store::ArticleStore;

pub async fn run_serve(
    mut config: Config,
    config_path: PathBuf,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    let server = config.server.clone();
    let token = env_key(TOKEN_VAR).or_else(|| server.token.clone());

    let store = Arc::new(ArticleStore::new(config.articles_dir()));
    let shared = config.shared();
    let runner = Arc::new(RunManager::new(
        Arc::new(ConfigPipelineFactory::new(shared.clone())),
        store.clone(),
        shared.clone(),
    ));

    eprintln!(
        "autodraft dashboard: http://{}:{}{}",
        server.host,
        server.port,
        if token.is_some() { " (token required)" } else { "" }
    );

    let state = ApiState {
        runner,
        store,
        config: shared,
        config_path: Some(config_path),
        token,
    };
    api::start_server(&server, state).await
}
