// src/cli/mod.rs — CLI definition (clap derive)

pub mod doctor;
pub mod history;
pub mod progress;
pub mod publish;
pub mod run;
pub mod serve;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "autodraft",
    about = "Draft articles with LLMs, rewriting until they read human",
    version
)]
pub struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the pipeline once in the foreground (default)
    Run(RunArgs),
    /// Serve the dashboard and JSON API
    Serve {
        /// Bind address (defaults to [server] host)
        #[arg(long)]
        host: Option<String>,
        /// Port (defaults to [server] port)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List saved articles, newest first
    History {
        #[arg(long, default_value = "1")]
        page: usize,
        #[arg(long, default_value = "10")]
        per_page: usize,
    },
    /// Print a saved article
    Show {
        /// Article id, e.g. article_zhipu_20260101_120000.md
        id: String,
    },
    /// Upload a saved article to the WeChat draft box
    Publish { id: String },
    /// Check credentials, paths and the WeChat connection
    Doctor,
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// gemini, zhipu, gemini-web or gemini-deepseek
    #[arg(short, long)]
    pub provider: Option<String>,

    /// Topic domain, e.g. "情感,心理"
    #[arg(short, long)]
    pub domain: Option<String>,

    /// Max score/rewrite iterations
    #[arg(short, long)]
    pub iterations: Option<u32>,

    /// Accept once the AI score drops below this (0-100)
    #[arg(short, long)]
    pub target: Option<u8>,

    /// Upload the result to the WeChat draft box
    #[arg(long)]
    pub upload: bool,

    /// Suppress progress output (only emit the article)
    #[arg(short, long)]
    pub quiet: bool,
}
