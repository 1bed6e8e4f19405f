// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use crate::infra::paths;

/// Config shared between the server and the runs it starts.
pub type SharedConfig = Arc<RwLock<Config>>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub providers: ProvidersConfig,

    #[serde(default)]
    pub cover: CoverConfig,

    #[serde(default)]
    pub prompts: PromptsConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub wechat: WeChatConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Topic-steering text handed to the generator when a request omits one.
    pub domain: String,
    /// A draft scoring strictly below this is accepted.
    pub target_score: u8,
    /// Requested article length (characters).
    pub article_length: u32,
    /// Only this many leading characters are sent to the scorer.
    pub score_sample_chars: usize,
    pub default_provider: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            domain: "情感,心理".into(),
            target_score: 30,
            article_length: 2000,
            score_sample_chars: 2000,
            default_provider: "gemini".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub gemini: GeminiConfig,
    #[serde(default)]
    pub zhipu: ZhipuConfig,
    #[serde(default)]
    pub deepseek: DeepSeekConfig,
    #[serde(default)]
    pub gemini_web: GeminiWebConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_iterations: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            model: "gemini-3-pro-preview".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
            timeout_seconds: 120,
            max_iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZhipuConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub max_iterations: u32,
}

impl Default for ZhipuConfig {
    fn default() -> Self {
        Self {
            model: "glm-4.7".into(),
            base_url: "https://open.bigmodel.cn/api/paas/v4".into(),
            timeout_seconds: 120,
            max_iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeepSeekConfig {
    pub model: String,
    pub base_url: String,
    pub timeout_seconds: u64,
    pub temperature: f32,
}

impl Default for DeepSeekConfig {
    fn default() -> Self {
        Self {
            model: "deepseek-chat".into(),
            base_url: "https://api.deepseek.com/v1".into(),
            timeout_seconds: 120,
            temperature: 0.7,
        }
    }
}

/// External Gemini web client, invoked as `<command> <args..> --promptfiles <file> --json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiWebConfig {
    pub command: String,
    pub args: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workdir: Option<String>,
    pub timeout_seconds: u64,
    pub max_iterations: u32,
}

impl Default for GeminiWebConfig {
    fn default() -> Self {
        Self {
            command: "npx".into(),
            args: vec!["-y".into(), "bun".into(), "main.ts".into()],
            workdir: None,
            timeout_seconds: 120,
            max_iterations: 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverConfig {
    pub enabled: bool,
    /// One of the cover styles, or "auto" to pick from the article text.
    pub style: String,
    /// Generation methods tried in order ("dalle", "placeholder").
    pub methods: Vec<String>,
    pub model: String,
    pub size: String,
    pub timeout_seconds: u64,
}

impl Default for CoverConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            style: "auto".into(),
            methods: vec!["dalle".into(), "placeholder".into()],
            model: "dall-e-3".into(),
            size: "1792x1024".into(),
            timeout_seconds: 60,
        }
    }
}

/// Optional minijinja overrides for the built-in prompts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub draft: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rewrite: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token for the API. `AUTODRAFT_API_TOKEN` takes precedence.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 5000,
            token: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeChatConfig {
    pub base_url: String,
    pub author: String,
    /// Pre-uploaded thumb used when an article has no cover of its own.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb_media_id: Option<String>,
    pub timeout_seconds: u64,
}

impl Default for WeChatConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.weixin.qq.com".into(),
            author: "AI助手".into(),
            thumb_media_id: None,
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub articles_dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub covers_dir: Option<String>,
}

impl Config {
    /// Load config from file, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = paths::config_file_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Write the config as TOML, creating the parent directory if needed.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn shared(self) -> SharedConfig {
        Arc::new(RwLock::new(self))
    }

    /// Clone out of a shared handle.
    pub fn current(shared: &SharedConfig) -> Config {
        shared.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn articles_dir(&self) -> PathBuf {
        self.storage
            .articles_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::articles_dir)
    }

    pub fn covers_dir(&self) -> PathBuf {
        self.storage
            .covers_dir
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(paths::covers_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_reasonable() {
        let c = Config::default();
        assert_eq!(c.pipeline.target_score, 30);
        assert_eq!(c.pipeline.article_length, 2000);
        assert_eq!(c.pipeline.score_sample_chars, 2000);
        assert_eq!(c.providers.gemini.max_iterations, 2);
        assert_eq!(c.providers.zhipu.model, "glm-4.7");
        assert!((c.providers.deepseek.temperature - 0.7).abs() < 0.001);
        assert!(c.cover.enabled);
        assert_eq!(c.server.port, 5000);
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.pipeline.target_score, 30);
        assert_eq!(config.providers.gemini_web.command, "npx");
    }

    #[test]
    fn test_partial_section_keeps_provider_defaults() {
        let toml_str = r#"
[providers.zhipu]
max_iterations = 5
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.zhipu.max_iterations, 5);
        assert_eq!(
            config.providers.zhipu.base_url,
            "https://open.bigmodel.cn/api/paas/v4"
        );
        assert_eq!(config.providers.zhipu.timeout_seconds, 120);
    }

    #[test]
    fn test_parse_full_toml() {
        let toml_str = r#"
[pipeline]
domain = "科技,AI"
target_score = 25
default_provider = "zhipu"

[providers.gemini_web]
command = "bun"
args = ["scripts/main.ts"]
workdir = "/opt/gemini-web"

[cover]
enabled = false
style = "tech"
methods = ["placeholder"]

[prompts]
topic = "Pick a topic about {{ domain }}"

[server]
port = 8080

[storage]
articles_dir = "/tmp/articles"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pipeline.domain, "科技,AI");
        assert_eq!(config.pipeline.target_score, 25);
        assert_eq!(config.pipeline.article_length, 2000);
        assert_eq!(config.providers.gemini_web.args, vec!["scripts/main.ts"]);
        assert_eq!(
            config.providers.gemini_web.workdir.as_deref(),
            Some("/opt/gemini-web")
        );
        assert!(!config.cover.enabled);
        assert_eq!(config.cover.methods, vec!["placeholder"]);
        assert!(config.prompts.topic.is_some());
        assert!(config.prompts.draft.is_none());
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.articles_dir(), PathBuf::from("/tmp/articles"));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.pipeline.domain = "职场".into();
        config.prompts.rewrite = Some("Rewrite: {{ text }}".into());
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.pipeline.domain, "职场");
        assert_eq!(loaded.prompts.rewrite.as_deref(), Some("Rewrite: {{ text }}"));
        assert!(loaded.prompts.topic.is_none());
    }
}
