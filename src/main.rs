// src/main.rs — autodraft entry point

use clap::Parser;
use std::path::PathBuf;

use autodraft::cli::{Cli, Commands, RunArgs};
use autodraft::infra::config::Config;
use autodraft::infra::{logger, paths};

#[tokio::main]
async fn main() {
    // Credentials may live in a .env next to where we run
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG); the server reports requests at info
    let level = match &cli.command {
        Some(Commands::Serve { .. }) => "info",
        _ => "warn",
    };
    logger::init_logging(level);

    // Load config (falls back to defaults if no config.toml)
    let config_path = cli
        .config
        .as_ref()
        .map(PathBuf::from)
        .unwrap_or_else(paths::config_file_path);
    let config = if config_path.exists() {
        Config::load_from(&config_path)?
    } else if cli.config.is_some() {
        anyhow::bail!("Config file not found: {}", config_path.display());
    } else {
        Config::default()
    };

    match cli.command {
        None => autodraft::cli::run::run_once(&config, RunArgs::default()).await,
        Some(Commands::Run(args)) => autodraft::cli::run::run_once(&config, args).await,
        Some(Commands::Serve { host, port }) => {
            autodraft::cli::serve::run_serve(config, config_path, host, port).await
        }
        Some(Commands::History { page, per_page }) => {
            autodraft::cli::history::list(&config, page, per_page).await
        }
        Some(Commands::Show { id }) => autodraft::cli::history::show(&config, &id).await,
        Some(Commands::Publish { id }) => {
            autodraft::cli::publish::run_publish(&config, &id).await
        }
        Some(Commands::Doctor) => autodraft::cli::doctor::run_doctor(&config, &config_path).await,
    }
}
