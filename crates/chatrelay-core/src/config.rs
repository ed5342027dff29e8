use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::Result;

/// Top-level configuration for the relay.
///
/// Loaded from `~/.chatrelay/config.toml` by default, then overlaid with
/// environment variables (see [`RelayConfig::apply_env_overrides`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub transcription: TranscriptionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl RelayConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: RelayConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Overlay values from the process environment.
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_env_overrides(|key| std::env::var(key).ok());
        self
    }

    /// Overlay values from an environment lookup.
    ///
    /// Recognized keys: `OPENAI_API_KEY`, `OPENAI_BASE_URL`, `OPENAI_MODEL`,
    /// `ASSEMBLY_API_KEY`, `CHATRELAY_DATABASE`, `CHATRELAY_HOST`,
    /// `CHATRELAY_PORT`. Empty values are ignored; an unparsable port is
    /// logged and ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.model.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.model.base_url = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.model.model = v;
        }
        if let Some(v) = get("ASSEMBLY_API_KEY") {
            self.transcription.api_key = v;
        }
        if let Some(v) = get("CHATRELAY_DATABASE") {
            self.storage.database_path = v;
        }
        if let Some(v) = get("CHATRELAY_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("CHATRELAY_PORT") {
            match v.trim().parse::<u16>() {
                Ok(port) => self.server.port = port,
                Err(e) => warn!(value = %v, error = %e, "Ignoring invalid CHATRELAY_PORT"),
            }
        }
    }

    /// Names of the credentials that are still unset.
    pub fn missing_credentials(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.model.api_key.trim().is_empty() {
            missing.push("OPENAI_API_KEY");
        }
        if self.transcription.api_key.trim().is_empty() {
            missing.push("ASSEMBLY_API_KEY");
        }
        missing
    }
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
    /// Largest accepted request body (audio uploads included).
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            log_level: "info".to_string(),
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

/// Chat turn handling.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Stored turns sent to the model as context.
    pub history_limit: usize,
    /// Longest accepted user message, in characters.
    pub max_message_chars: usize,
    /// User id used when a request does not name one.
    pub default_user_id: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_limit: 20,
            max_message_chars: 4000,
            default_user_id: "anonymous".to_string(),
        }
    }
}

/// Hosted chat model (OpenAI-compatible API).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "google/gemini-flash-1.5-8b-exp".to_string(),
        }
    }
}

/// Hosted transcription service (AssemblyAI).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionConfig {
    pub base_url: String,
    pub api_key: String,
    /// Delay between status polls while a job is queued or processing.
    pub poll_interval_ms: u64,
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.assemblyai.com".to_string(),
            api_key: String::new(),
            poll_interval_ms: 3000,
        }
    }
}

/// Conversation store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file. `~/` is expanded by the binary.
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: "~/.chatrelay/conversations.db".to_string(),
        }
    }
}
