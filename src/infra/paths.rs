// src/infra/paths.rs — XDG-compliant path management
//
// All paths respect the AUTODRAFT_HOME environment variable for isolation.
// When AUTODRAFT_HOME is set, config and data live under that directory.
// When unset, config uses ~/.autodraft/ and data uses XDG_DATA_HOME/autodraft.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the AUTODRAFT_HOME override, if set.
fn autodraft_home() -> Option<PathBuf> {
    std::env::var_os("AUTODRAFT_HOME").map(PathBuf::from)
}

/// Configuration directory: $AUTODRAFT_HOME/ or ~/.autodraft/
pub fn config_dir() -> PathBuf {
    if let Some(home) = autodraft_home() {
        return home;
    }
    dirs_home().join(".autodraft")
}

/// Data directory: $AUTODRAFT_HOME/data/ or ~/.local/share/autodraft/
pub fn data_dir() -> PathBuf {
    if let Some(home) = autodraft_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "autodraft") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Home directory, or the current directory when none can be determined.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Saved article records.
pub fn articles_dir() -> PathBuf {
    data_dir().join("articles")
}

/// Generated cover images.
pub fn covers_dir() -> PathBuf {
    data_dir().join("covers")
}

/// Scratch files (prompt files handed to external clients).
pub fn cache_dir() -> PathBuf {
    config_dir().join("cache")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure all required directories exist
pub async fn ensure_dirs() -> anyhow::Result<()> {
    let dirs = [config_dir(), cache_dir(), data_dir(), articles_dir(), covers_dir()];

    for dir in &dirs {
        tokio::fs::create_dir_all(dir).await?;
    }

    Ok(())
}
