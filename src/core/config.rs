use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "briefly.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub assistant: AssistantConfig,
    pub providers: ProvidersConfig,
    pub storage: StorageConfig,
    pub server: ServerConfig,
    pub polling: PollingConfig,
    pub speech: SpeechConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub name: String,
    pub instructions: String,
    /// Reuse an existing remote assistant instead of creating one on startup.
    pub assistant_id: Option<String>,
    /// Conversation resumed by `briefly chat`.
    pub thread_id: Option<String>,
    /// Per-request limit for assistant and speech API calls.
    pub request_timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            name: "Custom Tool Assistant".to_string(),
            instructions: "You are a helpful assistant. Use the to-do list tools to manage \
                           the user's tasks, get_random_quote for quotes, get_top_headlines \
                           for news and get_weather for the weather."
                .to_string(),
            assistant_id: None,
            thread_id: None,
            request_timeout_secs: 60,
        }
    }
}

impl AssistantConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub quote_base_url: String,
    pub news_api_key: String,
    pub news_base_url: String,
    pub weather_api_key: String,
    pub weather_base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            quote_base_url: "https://zenquotes.io/api/random".to_string(),
            news_api_key: String::new(),
            news_base_url: "https://newsapi.org/v2/top-headlines".to_string(),
            weather_api_key: String::new(),
            weather_base_url: "https://api.weatherapi.com/v1/current.json".to_string(),
            request_timeout_secs: 15,
        }
    }
}

impl ProvidersConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub tasks_db_path: PathBuf,
    pub history_db_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            tasks_db_path: PathBuf::from("todo.db"),
            history_db_path: PathBuf::from("message-history.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub poll_interval_ms: u64,
    pub max_poll_interval_ms: u64,
    pub backoff_factor: f64,
    pub max_attempts: u32,
    pub deadline_secs: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2000,
            max_poll_interval_ms: 5000,
            backoff_factor: 1.5,
            max_attempts: 60,
            deadline_secs: 180,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub model: String,
    pub voice: String,
    pub output_path: PathBuf,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".to_string(),
            voice: "alloy".to_string(),
            output_path: PathBuf::from("output.mp3"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
        }
    }
}

impl AppConfig {
    /// Load the TOML file if present, otherwise start from defaults, then
    /// apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let env_path = std::env::var("BRIEFLY_CONFIG").ok().map(PathBuf::from);
        let path = path
            .map(Path::to_path_buf)
            .or(env_path)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("reading config file {}", path.display()))?;
            Self::from_toml(&raw)
                .with_context(|| format!("parsing config file {}", path.display()))?
        } else {
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env<F: Fn(&str) -> Option<String>>(&mut self, get: F) {
        let non_empty = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("OPENAI_API_KEY") {
            self.assistant.api_key = v;
        }
        if let Some(v) = non_empty("BRIEFLY_ASSISTANT_ID") {
            self.assistant.assistant_id = Some(v);
        }
        if let Some(v) = non_empty("BRIEFLY_THREAD_ID") {
            self.assistant.thread_id = Some(v);
        }
        if let Some(v) = non_empty("NEWS_API_KEY") {
            self.providers.news_api_key = v;
        }
        if let Some(v) = non_empty("WEATHER_API_KEY") {
            self.providers.weather_api_key = v;
        }
        if let Some(v) = non_empty("BRIEFLY_DB_PATH") {
            self.storage.tasks_db_path = PathBuf::from(v);
        }
        if let Some(v) = non_empty("BRIEFLY_HISTORY_DB_PATH") {
            self.storage.history_db_path = PathBuf::from(v);
        }
    }
}
