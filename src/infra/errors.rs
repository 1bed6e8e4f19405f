// src/infra/errors.rs — Error types for autodraft

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DraftError {
    // Provider errors (abort the run, never retried)
    #[error("Provider '{provider}' error: {message}")]
    Provider { provider: String, message: String },

    #[error("Provider '{provider}' timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    // Configuration errors (raised before any external call)
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing credential: set {env_var} in the environment or .env")]
    MissingCredential { env_var: String },

    // Run lifecycle
    #[error("Task already running")]
    RunInProgress,

    #[error("Run stopped by user")]
    Cancelled,

    // Storage
    #[error("Failed to save article: {0}")]
    Persistence(String),

    #[error("Invalid article id '{0}'")]
    InvalidRecordId(String),

    #[error("Article '{0}' not found")]
    NotFound(String),

    // Templates / publishing
    #[error("Prompt template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("WeChat API error (errcode {errcode}): {errmsg}")]
    WeChat { errcode: i64, errmsg: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DraftError {
    /// Errors that mean the run could not even start talking to providers.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            DraftError::Config(_) | DraftError::MissingCredential { .. }
        )
    }

    /// Errors raised by an external generator, scorer or rewriter.
    pub fn is_provider(&self) -> bool {
        matches!(
            self,
            DraftError::Provider { .. } | DraftError::Timeout { .. }
        )
    }
}
